use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::config::AudioSettings;
use crate::media::MediaEvent;

use super::sink::{create_sink_at, probe_duration};
use super::types::{AudioCmd, ElementHandle, PlayClock, Stamped};

/// State owned by the audio thread.
struct Deck {
    stream: Option<OutputStream>,
    loaded: Option<PathBuf>,
    sink: Option<Sink>,
    clock: PlayClock,
    generation: u64,
    events: Sender<Stamped>,
    info: ElementHandle,
}

impl Deck {
    fn emit(&self, event: MediaEvent) {
        // The element may already be gone during shutdown.
        let _ = self.events.send(Stamped {
            generation: self.generation,
            event,
        });
    }

    fn publish(&self) {
        if let Ok(mut info) = self.info.lock() {
            info.paused = !self.clock.running();
            info.position = self.clock.elapsed();
        }
    }

    fn stop_sink(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
    }

    /// Build a paused sink for the loaded source at the clock position.
    fn ensure_sink(&mut self) -> Result<(), String> {
        if self.sink.is_some() {
            return Ok(());
        }
        let Some(stream) = self.stream.as_ref() else {
            return Err("no audio output device".to_string());
        };
        let Some(path) = self.loaded.as_ref() else {
            return Err("nothing loaded".to_string());
        };
        let sink = create_sink_at(stream, path, self.clock.elapsed()).map_err(|e| e.to_string())?;
        self.sink = Some(sink);
        Ok(())
    }

    fn load(&mut self, path: Option<PathBuf>, generation: u64) {
        self.stop_sink();
        self.clock = PlayClock::default();
        self.generation = generation;
        let duration = path.as_deref().and_then(probe_duration);
        tracing::debug!(path = ?path, ?duration, "source loaded");
        self.loaded = path;
        if let Ok(mut info) = self.info.lock() {
            info.duration = duration;
        }
    }

    fn play(&mut self) {
        if self.clock.running() {
            return;
        }
        if let Err(msg) = self.ensure_sink() {
            tracing::warn!(%msg, "cannot start playback");
            self.emit(MediaEvent::Error(msg));
            return;
        }
        if let Some(s) = self.sink.as_ref() {
            s.play();
        }
        self.clock.start();
        self.emit(MediaEvent::Play);
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
        if self.clock.running() {
            self.clock.pause();
            self.emit(MediaEvent::Pause);
        }
    }

    fn seek(&mut self, at: Duration) {
        let limit = self.info.lock().ok().and_then(|i| i.duration);
        let at = limit.map_or(at, |d| at.min(d));
        self.clock.set(at);

        // Rebuild the sink and skip into the file.
        if self.sink.is_some() {
            self.stop_sink();
            match self.ensure_sink() {
                Ok(()) if self.clock.running() => {
                    if let Some(s) = self.sink.as_ref() {
                        s.play();
                    }
                }
                Ok(()) => {}
                Err(msg) => {
                    self.clock.pause();
                    self.emit(MediaEvent::Error(msg));
                }
            }
        }
        self.emit(MediaEvent::TimeUpdate(at));
    }

    fn quit(&mut self, fade_out_ms: u64) {
        if let Some(s) = self.sink.as_ref() {
            if self.clock.running() {
                fade_out_sink(s, fade_out_ms);
            }
        }
        self.stop_sink();
    }

    /// Detect a drained sink: the source played to its end.
    fn check_ended(&mut self) -> bool {
        let drained = self.clock.running() && self.sink.as_ref().is_some_and(Sink::empty);
        if drained {
            self.stop_sink();
            self.clock = PlayClock::default();
            self.emit(MediaEvent::Ended);
        }
        drained
    }
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    sink.set_volume(1.0);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(1.0 - t);
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

fn open_stream() -> Option<OutputStream> {
    match OutputStreamBuilder::open_default_stream() {
        Ok(mut stream) => {
            // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
            // but noisy for a TUI app.
            stream.log_on_drop(false);
            Some(stream)
        }
        Err(e) => {
            tracing::error!(error = %e, "no audio output device; playback disabled");
            None
        }
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<Stamped>,
    info: ElementHandle,
    settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let tick = Duration::from_millis(settings.time_update_ms.max(1));
        let mut deck = Deck {
            stream: open_stream(),
            loaded: None,
            sink: None,
            clock: PlayClock::default(),
            generation: 0,
            events,
            info,
        };
        let mut last_update = Instant::now();

        loop {
            match rx.recv_timeout(tick.min(Duration::from_millis(200))) {
                Ok(AudioCmd::Load { path, generation }) => deck.load(path, generation),
                Ok(AudioCmd::Play) => deck.play(),
                Ok(AudioCmd::Pause) => deck.pause(),
                Ok(AudioCmd::Seek(at)) => deck.seek(at),
                Ok(AudioCmd::Quit { fade_out_ms }) => {
                    deck.quit(fade_out_ms);
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    deck.quit(0);
                    break;
                }
            }

            deck.check_ended();
            if deck.clock.running() && last_update.elapsed() >= tick {
                deck.emit(MediaEvent::TimeUpdate(deck.clock.elapsed()));
                last_update = Instant::now();
            }
            deck.publish();
        }
        tracing::debug!("audio thread finished");
    })
}
