//! Playlist controller: the single authority over the uploaded tracks, the
//! current position and whether playback is active.
//!
//! The controller mediates between the upload surface, the persistence
//! store (`crate::store`) and the playback element (`crate::media`). Every
//! operation runs to completion on the caller's thread; element events are
//! handled strictly in arrival order.

mod controller;
mod error;
mod model;

pub use controller::*;
pub use error::*;
pub use model::*;

#[cfg(test)]
mod tests;
