use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaylistError {
    #[error("track {index} does not exist (playlist has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("seeking is not available")]
    SeekUnavailable,
}

/// A visible but non-blocking condition for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An index from storage or input did not fit the playlist.
    IndexOutOfRange { index: usize, len: usize },
    /// The element refused or failed to play.
    PlaybackFailed(String),
    /// A persistence write did not go through.
    StorageFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::IndexOutOfRange { index, len } => {
                write!(f, "track {} is out of range ({} tracks)", index + 1, len)
            }
            Notice::PlaybackFailed(msg) => write!(f, "could not play: {msg}"),
            Notice::StorageFailed(msg) => write!(f, "could not save playlist: {msg}"),
        }
    }
}

impl From<&PlaylistError> for Notice {
    fn from(err: &PlaylistError) -> Self {
        match err {
            PlaylistError::IndexOutOfRange { index, len } => Notice::IndexOutOfRange {
                index: *index,
                len: *len,
            },
            PlaylistError::SeekUnavailable => Notice::PlaybackFailed(err.to_string()),
        }
    }
}
