//! Uploaded blobs and the playable URLs minted for them.
//!
//! A `Blob` is the raw content handle of one uploaded file. The playback
//! element never opens a blob directly; it is handed a short-lived
//! `PlayableUrl` which resolves back to the blob until it is revoked.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// One uploaded audio item as selected by the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub name: String,
    pub path: PathBuf,
}

impl Blob {
    /// Build a blob from a path, using its file name as display name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        Self { name, path }
    }
}

/// Issues and revokes playable URLs for blobs.
pub trait UrlMinter: Send + Sync {
    /// Mint a URL for `blob`, or `None` when the blob cannot be played.
    fn create(&self, blob: &Blob) -> Option<String>;
    /// Release a URL previously returned by `create`.
    fn revoke(&self, url: &str);
}

/// Scoped ownership of a minted URL: revoked exactly once, on drop.
pub struct PlayableUrl {
    url: String,
    minter: Arc<dyn UrlMinter>,
}

impl PlayableUrl {
    /// Acquire a URL for `blob` from `minter`.
    pub fn acquire(minter: &Arc<dyn UrlMinter>, blob: &Blob) -> Option<Self> {
        let url = minter.create(blob)?;
        Some(Self {
            url,
            minter: Arc::clone(minter),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for PlayableUrl {
    fn drop(&mut self) {
        self.minter.revoke(&self.url);
    }
}

impl fmt::Debug for PlayableUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PlayableUrl").field(&self.url).finish()
    }
}

const URL_PREFIX: &str = "blob:playdeck/";

/// In-process URL table mapping `blob:playdeck/<n>` to files on disk.
#[derive(Default)]
pub struct BlobUrls {
    next_id: AtomicU64,
    live: Mutex<HashMap<String, PathBuf>>,
}

impl BlobUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the file behind a live URL. Revoked or foreign URLs yield `None`.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        self.live.lock().ok()?.get(url).cloned()
    }

    /// Number of URLs currently minted and not yet revoked.
    pub fn live(&self) -> usize {
        self.live.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn is_playable(path: &Path) -> bool {
        path.is_file()
    }
}

impl UrlMinter for BlobUrls {
    fn create(&self, blob: &Blob) -> Option<String> {
        if !Self::is_playable(&blob.path) {
            tracing::debug!(path = %blob.path.display(), "blob is not a readable file");
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{URL_PREFIX}{id}");
        if let Ok(mut live) = self.live.lock() {
            live.insert(url.clone(), blob.path.clone());
        }
        Some(url)
    }

    fn revoke(&self, url: &str) {
        if let Ok(mut live) = self.live.lock() {
            if live.remove(url).is_none() {
                tracing::debug!(url, "revoke of unknown url");
            }
        }
    }
}
