//! Persistence port: a small string key-value store that outlives a session.
//!
//! The playlist controller is the only writer of its keys and treats every
//! read as possibly absent or malformed.

mod file;
mod memory;
mod snapshot;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use snapshot::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Synchronous string-keyed, string-valued storage.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}
