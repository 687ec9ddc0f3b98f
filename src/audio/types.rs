//! Audio-related small types and handles.
//!
//! This module defines the commands sent to the audio thread, the snapshot
//! of element state it publishes, and the play clock it keeps.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::media::MediaEvent;

#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the current source. `None` detaches the element.
    ///
    /// Events emitted afterwards carry `generation`.
    Load {
        path: Option<PathBuf>,
        generation: u64,
    },
    /// Start or resume the loaded source.
    Play,
    /// Pause, keeping the position.
    Pause,
    /// Move to an absolute position in the loaded source.
    Seek(Duration),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

#[derive(Debug, Clone)]
/// Element state published by the audio thread.
pub struct ElementInfo {
    /// Whether playback is paused (or nothing is loaded).
    pub paused: bool,
    /// Position in the loaded source.
    pub position: Duration,
    /// Length of the loaded source, when it could be probed.
    pub duration: Option<Duration>,
}

impl Default for ElementInfo {
    fn default() -> Self {
        Self {
            paused: true,
            position: Duration::ZERO,
            duration: None,
        }
    }
}

pub type ElementHandle = Arc<Mutex<ElementInfo>>;

/// An event tagged with the load it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped {
    pub generation: u64,
    pub event: MediaEvent,
}

/// Wall-clock position keeper: accumulated time plus the running stretch.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct PlayClock {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl PlayClock {
    pub(super) fn running(&self) -> bool {
        self.started_at.is_some()
    }

    pub(super) fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub(super) fn pause(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    /// Jump to `at`, keeping the running/paused state.
    pub(super) fn set(&mut self, at: Duration) {
        self.accumulated = at;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    pub(super) fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }
}
