//! Playlist model types: `Track`, `PlaybackState`, `PlayerState` and the
//! options that select between the minimal and the richer player.

use std::time::Duration;

use crate::blob::{Blob, PlayableUrl};
use crate::store::SnapshotKeys;

/// One uploaded item together with its playable URL, if one could be minted.
#[derive(Debug)]
pub struct Track {
    pub blob: Blob,
    pub(super) url: Option<PlayableUrl>,
}

impl Track {
    pub(super) fn new(blob: Blob) -> Self {
        Self { blob, url: None }
    }

    pub fn name(&self) -> &str {
        &self.blob.name
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_ref().map(PlayableUrl::as_str)
    }
}

/// Position and activity of the player.
///
/// `current_index` is always a valid index while the playlist is non-empty
/// and is 0 (with `is_playing == false`) when it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub current_index: usize,
    pub is_playing: bool,
    pub current_time: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    LoadedPaused,
    LoadedPlaying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Allow seeking to a fraction of the current track.
    pub enable_seek_bar: bool,
    /// Treat the element's `Play` event as "playback is active".
    pub track_play_start_event: bool,
    pub keys: SnapshotKeys,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            enable_seek_bar: true,
            track_play_start_event: true,
            keys: SnapshotKeys::default(),
        }
    }
}
