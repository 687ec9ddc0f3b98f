//! Application view types: `App`, `InputMode` and `SeekBar`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// What keystrokes currently go to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing paths to upload.
    Upload,
}

/// Screen position of the progress bar, recorded at draw time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SeekBar {
    pub x: u16,
    pub y: u16,
    pub width: u16,
}

impl SeekBar {
    /// Map a click to a fraction of the bar: click offset over bar width.
    pub fn fraction_at(&self, column: u16, row: u16) -> Option<f64> {
        if self.width == 0 || row != self.y || column < self.x || column >= self.x + self.width {
            return None;
        }
        Some(f64::from(column - self.x) / f64::from(self.width))
    }
}

const MAX_NOTICES: usize = 3;

/// The main view model.
pub struct App {
    pub selected: usize,
    pub mode: InputMode,
    pub input: String,
    /// Cursor follows the current track.
    pub follow_playback: bool,
    pub seek_bar: Option<SeekBar>,
    notices: VecDeque<(String, Instant)>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            selected: 0,
            mode: InputMode::Normal,
            input: String::new(),
            follow_playback: true,
            seek_bar: None,
            notices: VecDeque::new(),
        }
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1) % len;
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            len - 1
        } else {
            self.selected - 1
        };
    }

    /// Keep the cursor on an existing row.
    pub fn clamp_selection(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Enable following playback (cursor follows currently playing track).
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    pub fn enter_upload_mode(&mut self) {
        self.mode = InputMode::Upload;
        self.input.clear();
    }

    pub fn cancel_upload(&mut self) {
        self.mode = InputMode::Normal;
        self.input.clear();
    }

    /// Leave upload mode and hand over what was typed.
    pub fn take_input(&mut self) -> String {
        self.mode = InputMode::Normal;
        std::mem::take(&mut self.input)
    }

    pub fn push_notice(&mut self, msg: impl Into<String>, now: Instant) {
        self.notices.push_back((msg.into(), now));
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }

    /// Drop notices older than `ttl`.
    pub fn prune_notices(&mut self, now: Instant, ttl: Duration) {
        self.notices
            .retain(|(_, at)| now.saturating_duration_since(*at) < ttl);
    }

    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().map(|(m, _)| m.as_str())
    }
}
