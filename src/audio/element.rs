use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::blob::BlobUrls;
use crate::config::AudioSettings;
use crate::media::{ElementError, MediaEvent, PlaybackElement};

use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, ElementHandle, ElementInfo, Stamped};

/// Playback element backed by a rodio output stream on a dedicated thread.
///
/// Sources are given as playable URLs and resolved through `BlobUrls`, so a
/// revoked URL can no longer be loaded.
pub struct AudioElement {
    tx: Sender<AudioCmd>,
    events: Receiver<Stamped>,
    pending: VecDeque<MediaEvent>,
    generation: u64,
    info: ElementHandle,
    urls: Arc<BlobUrls>,
    src: Option<String>,
    loaded: bool,
    quit_fade_out_ms: u64,
    join: Option<JoinHandle<()>>,
}

impl AudioElement {
    pub fn new(urls: Arc<BlobUrls>, settings: AudioSettings) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (event_tx, event_rx) = mpsc::channel::<Stamped>();
        let info: ElementHandle = Arc::new(Mutex::new(ElementInfo::default()));
        let quit_fade_out_ms = settings.quit_fade_out_ms;

        let join = spawn_audio_thread(rx, event_tx, info.clone(), settings);

        Self {
            tx,
            events: event_rx,
            pending: VecDeque::new(),
            generation: 0,
            info,
            urls,
            src: None,
            loaded: false,
            quit_fade_out_ms,
            join: Some(join),
        }
    }

    /// Fade out, stop the audio thread and wait for it.
    pub fn quit_softly(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        let _ = self.tx.send(AudioCmd::Quit {
            fade_out_ms: self.quit_fade_out_ms,
        });
        let _ = join.join();
    }

    fn send(&mut self, cmd: AudioCmd) -> Result<(), ElementError> {
        self.tx.send(cmd).map_err(|_| ElementError::Disconnected)
    }
}

/// Next event from the audio thread that belongs to load `generation`.
///
/// Events left over from earlier loads are dropped.
pub(super) fn next_current(events: &Receiver<Stamped>, generation: u64) -> Option<MediaEvent> {
    while let Ok(stamped) = events.try_recv() {
        if stamped.generation == generation {
            return Some(stamped.event);
        }
        tracing::trace!(event = ?stamped.event, "dropping event from a previous source");
    }
    None
}

impl PlaybackElement for AudioElement {
    fn set_src(&mut self, url: Option<&str>) {
        // Anything still queued belongs to the previous source.
        self.generation += 1;
        self.pending.clear();
        self.src = url.map(str::to_string);
        let path = url.and_then(|u| self.urls.resolve(u));
        if let (Some(u), None) = (url, path.as_ref()) {
            self.pending
                .push_back(MediaEvent::Error(format!("source {u} is not available")));
        }
        self.loaded = path.is_some();
        if let Ok(mut info) = self.info.lock() {
            *info = ElementInfo::default();
        }
        let load = AudioCmd::Load {
            path,
            generation: self.generation,
        };
        if self.send(load).is_err() {
            tracing::warn!("audio thread is gone; cannot load source");
        }
    }

    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn play(&mut self) -> Result<(), ElementError> {
        if !self.loaded {
            return Err(ElementError::NoSource);
        }
        self.send(AudioCmd::Play)?;
        // The audio thread republishes this once it has acted on the command.
        if let Ok(mut info) = self.info.lock() {
            info.paused = false;
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Ok(mut info) = self.info.lock() {
            info.paused = true;
        }
        let _ = self.send(AudioCmd::Pause);
    }

    fn paused(&self) -> bool {
        self.info.lock().map(|i| i.paused).unwrap_or(true)
    }

    fn current_time(&self) -> Duration {
        self.info.lock().map(|i| i.position).unwrap_or_default()
    }

    fn set_current_time(&mut self, at: Duration) {
        if let Ok(mut info) = self.info.lock() {
            info.position = at;
        }
        let _ = self.send(AudioCmd::Seek(at));
    }

    fn duration(&self) -> Option<Duration> {
        self.info.lock().ok().and_then(|i| i.duration)
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        next_current(&self.events, self.generation)
    }
}

impl Drop for AudioElement {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = self.tx.send(AudioCmd::Quit { fade_out_ms: 0 });
            let _ = join.join();
        }
    }
}
