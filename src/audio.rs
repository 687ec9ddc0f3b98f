//! rodio-backed playback element.
//!
//! Audio runs on its own thread which owns the output stream; the element
//! talks to it over a command channel and receives `MediaEvent`s back.

mod element;
mod sink;
mod thread;
mod types;

pub use element::AudioElement;
