//! Playback element port.
//!
//! The element decodes and renders audio; the playlist controller only
//! drives it (`src`, `play`, `pause`, seeking) and consumes its events.

use std::time::Duration;

use thiserror::Error;

/// Events emitted by a playback element, consumed in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// The current source played to its end.
    Ended,
    /// Playback was paused, by the controller or by the user.
    Pause,
    /// Playback started or resumed.
    Play,
    /// Periodic progress report.
    TimeUpdate(Duration),
    /// The element failed to load or play its source.
    Error(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("no source loaded")]
    NoSource,
    #[error("playback rejected: {0}")]
    Rejected(String),
    #[error("playback element is gone")]
    Disconnected,
}

pub trait PlaybackElement {
    /// Point the element at a playable URL, or detach it with `None`.
    ///
    /// Events still pending from the previous source are discarded.
    fn set_src(&mut self, url: Option<&str>);
    fn src(&self) -> Option<&str>;
    /// Request playback. Completion is not awaited.
    fn play(&mut self) -> Result<(), ElementError>;
    fn pause(&mut self);
    /// Whether the element is paused. A freshly loaded source is paused.
    fn paused(&self) -> bool;
    fn current_time(&self) -> Duration;
    fn set_current_time(&mut self, at: Duration);
    /// Length of the current source, when known.
    fn duration(&self) -> Option<Duration>;
    /// Next pending event, if any.
    fn poll_event(&mut self) -> Option<MediaEvent>;
}
