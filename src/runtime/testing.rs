use std::collections::VecDeque;
use std::time::Duration;

use crate::media::{ElementError, MediaEvent, PlaybackElement};

/// Element that accepts every command and reports the matching events.
#[derive(Default)]
pub struct SilentElement {
    pub src: Option<String>,
    pub at: Duration,
    pub duration: Option<Duration>,
    pub playing: bool,
    pub events: VecDeque<MediaEvent>,
}

impl PlaybackElement for SilentElement {
    fn set_src(&mut self, url: Option<&str>) {
        self.src = url.map(str::to_string);
        self.at = Duration::ZERO;
        self.playing = false;
        self.events.clear();
    }

    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn play(&mut self) -> Result<(), ElementError> {
        if self.src.is_none() {
            return Err(ElementError::NoSource);
        }
        self.playing = true;
        self.events.push_back(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
        self.events.push_back(MediaEvent::Pause);
    }

    fn paused(&self) -> bool {
        !self.playing
    }

    fn current_time(&self) -> Duration {
        self.at
    }

    fn set_current_time(&mut self, at: Duration) {
        self.at = at;
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }
}
