use std::sync::Arc;
use std::time::Duration;

use crate::blob::{Blob, PlayableUrl, UrlMinter};
use crate::media::{MediaEvent, PlaybackElement};
use crate::store::{self, Store};

use super::error::{Notice, PlaylistError};
use super::model::{ControllerOptions, PlaybackState, PlayerState, Track};

pub struct PlaylistController<S, E> {
    store: S,
    element: E,
    minter: Arc<dyn UrlMinter>,
    options: ControllerOptions,
    tracks: Vec<Track>,
    playback: PlaybackState,
    notices: Vec<Notice>,
}

impl<S: Store, E: PlaybackElement> PlaylistController<S, E> {
    pub fn new(store: S, element: E, minter: Arc<dyn UrlMinter>, options: ControllerOptions) -> Self {
        Self {
            store,
            element,
            minter,
            options,
            tracks: Vec::new(),
            playback: PlaybackState::default(),
            notices: Vec::new(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn current_index(&self) -> usize {
        self.playback.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing
    }

    pub fn current_time(&self) -> Duration {
        self.playback.current_time
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.playback.current_index)
    }

    /// Length of the loaded track as reported by the element.
    pub fn duration(&self) -> Option<Duration> {
        self.element.duration()
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn state(&self) -> PlayerState {
        if self.tracks.is_empty() {
            PlayerState::Idle
        } else if self.playback.is_playing {
            PlayerState::LoadedPlaying
        } else {
            PlayerState::LoadedPaused
        }
    }

    #[cfg(test)]
    pub(crate) fn element(&self) -> &E {
        &self.element
    }

    #[cfg(test)]
    pub(crate) fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Release every URL and give the element back, e.g. for a soft shutdown.
    pub fn into_element(mut self) -> E {
        self.tracks.clear();
        self.element
    }

    /// Hand pending notices to the caller, clearing them.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Append `blobs` to the playlist, re-mint every playable URL and persist.
    ///
    /// Returns the number of tracks added. Playback is paused; the current
    /// index is kept unless the playlist was empty.
    pub fn upload_files(&mut self, blobs: impl IntoIterator<Item = Blob>) -> usize {
        let incoming: Vec<Blob> = blobs.into_iter().collect();
        if incoming.is_empty() {
            tracing::debug!("upload with no files");
            return 0;
        }
        let added = incoming.len();
        let was_idle = self.tracks.is_empty();
        let resume_at = self.element.current_time();

        if self.playback.is_playing || !self.element.paused() {
            self.element.pause();
            self.playback.is_playing = false;
        }

        // Release before re-minting so no stale URL outlives its track list.
        for track in &mut self.tracks {
            track.url = None;
        }
        self.tracks.extend(incoming.into_iter().map(Track::new));
        for track in &mut self.tracks {
            track.url = PlayableUrl::acquire(&self.minter, &track.blob);
            if track.url.is_none() {
                tracing::warn!(name = %track.blob.name, "no playable url for uploaded file");
            }
        }

        if was_idle {
            self.playback.current_index = 0;
            self.playback.current_time = Duration::ZERO;
        }
        self.load_current();
        if !was_idle && !resume_at.is_zero() {
            self.element.set_current_time(resume_at);
        }

        tracing::info!(added, total = self.tracks.len(), "uploaded files");
        self.persist_tracks();
        self.persist_index();
        added
    }

    /// Rebuild the playlist and position from storage. Meant to run once at startup.
    ///
    /// Missing or malformed values mean "no prior state". Entries whose blob
    /// can no longer be turned into a playable URL are dropped, and an index
    /// that does not fit the restored playlist is clamped.
    pub fn restore_from_storage(&mut self) {
        self.tracks.clear();
        self.playback = PlaybackState::default();

        let raw_tracks = self.read(&self.options.keys.tracks);
        match store::decode_tracks(raw_tracks.as_deref()) {
            Some(blobs) => {
                let total = blobs.len();
                for blob in blobs {
                    match PlayableUrl::acquire(&self.minter, &blob) {
                        Some(url) => self.tracks.push(Track {
                            blob,
                            url: Some(url),
                        }),
                        None => {
                            tracing::warn!(name = %blob.name, path = %blob.path.display(), "dropping unplayable stored track")
                        }
                    }
                }
                tracing::info!(restored = self.tracks.len(), stored = total, "restored playlist");
            }
            None if raw_tracks.is_some() => {
                tracing::warn!("stored track list is malformed; starting empty")
            }
            None => {}
        }

        let raw_index = self.read(&self.options.keys.index);
        match store::decode_index(raw_index.as_deref()) {
            Some(index) => self.playback.current_index = index,
            None if raw_index.is_some() => {
                tracing::warn!(raw = ?raw_index, "stored track index is malformed; using 0")
            }
            None => {}
        }

        if let Err(err) = self.validate_index() {
            tracing::warn!(%err, "stored track index does not fit the playlist; clamped");
            self.notices.push(Notice::from(&err));
            self.persist_index();
        }
        self.load_current();
    }

    /// Make track `index` current and start playing it.
    ///
    /// Out-of-range indices leave all state untouched.
    pub fn select_track(&mut self, index: usize) -> Result<(), PlaylistError> {
        let len = self.tracks.len();
        if index >= len {
            tracing::warn!(index, len, "ignoring selection of missing track");
            return Err(PlaylistError::IndexOutOfRange { index, len });
        }

        self.set_index(index);
        self.playback.is_playing = true;
        self.load_current();
        self.start_playback();
        Ok(())
    }

    /// Advance to the next track, wrapping to the first after the last.
    pub fn on_playback_ended(&mut self) {
        let len = self.tracks.len();
        if len == 0 {
            return;
        }
        let next = if self.playback.current_index + 1 < len {
            self.playback.current_index + 1
        } else {
            0
        };
        tracing::debug!(from = self.playback.current_index, to = next, "track ended");

        self.set_index(next);
        // Reload even when the index is unchanged so a single track loops.
        self.load_current();
        if self.playback.is_playing {
            self.start_playback();
        }
    }

    pub fn on_playback_paused(&mut self) {
        self.playback.is_playing = false;
    }

    pub fn on_playback_started(&mut self) {
        if self.options.track_play_start_event && !self.tracks.is_empty() {
            self.playback.is_playing = true;
        }
    }

    pub fn on_time_update(&mut self, at: Duration) {
        self.playback.current_time = at;
    }

    /// Jump to `fraction` (0.0 ..= 1.0) of the current track.
    pub fn seek_to(&mut self, fraction: f64) -> Result<Duration, PlaylistError> {
        if !self.options.enable_seek_bar || self.tracks.is_empty() || !fraction.is_finite() {
            return Err(PlaylistError::SeekUnavailable);
        }
        let Some(total) = self.element.duration() else {
            return Err(PlaylistError::SeekUnavailable);
        };

        let at = total.mul_f64(fraction.clamp(0.0, 1.0));
        self.element.set_current_time(at);
        self.playback.current_time = at;
        Ok(at)
    }

    /// Toggle the element the way its own play/pause control would.
    ///
    /// The element's paused state decides the direction; `is_playing`
    /// follows from the `Play`/`Pause` events it emits.
    pub fn toggle_playback(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        if !self.element.paused() {
            self.element.pause();
            return;
        }
        if self.element.src().is_none() {
            self.load_current();
        }
        if let Err(e) = self.element.play() {
            tracing::warn!(error = %e, "element refused to play");
            self.notices.push(Notice::PlaybackFailed(e.to_string()));
        }
    }

    /// Drop every track, release their URLs and forget the stored playlist.
    pub fn reset(&mut self) {
        if self.playback.is_playing || !self.element.paused() {
            self.element.pause();
        }
        if !self.tracks.is_empty() {
            self.element.set_src(None);
        }
        self.tracks.clear();
        self.playback = PlaybackState::default();

        let keys = self.options.keys.clone();
        for key in [&keys.tracks, &keys.index] {
            if let Err(e) = self.store.delete(key) {
                tracing::warn!(key = %key, error = %e, "failed to delete stored key");
                self.notices.push(Notice::StorageFailed(e.to_string()));
            }
        }
        tracing::info!("playlist reset");
    }

    pub fn handle_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Ended => self.on_playback_ended(),
            MediaEvent::Pause => self.on_playback_paused(),
            MediaEvent::Play => self.on_playback_started(),
            MediaEvent::TimeUpdate(at) => self.on_time_update(at),
            MediaEvent::Error(msg) => {
                tracing::warn!(%msg, "playback element error");
                self.notices.push(Notice::PlaybackFailed(msg));
            }
        }
    }

    /// Drain and handle every pending element event. Returns how many were handled.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.element.poll_event() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn validate_index(&mut self) -> Result<(), PlaylistError> {
        let len = self.tracks.len();
        let index = self.playback.current_index;
        if len == 0 {
            self.playback.current_index = 0;
            self.playback.is_playing = false;
            return Ok(());
        }
        if index >= len {
            self.playback.current_index = len - 1;
            return Err(PlaylistError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    fn set_index(&mut self, index: usize) {
        self.playback.current_time = Duration::ZERO;
        if self.playback.current_index != index {
            self.playback.current_index = index;
            self.persist_index();
        }
    }

    fn load_current(&mut self) {
        let url = self
            .tracks
            .get(self.playback.current_index)
            .and_then(Track::url);
        self.element.set_src(url);
    }

    fn start_playback(&mut self) {
        if let Err(e) = self.element.play() {
            tracing::warn!(error = %e, "element refused to play");
            self.playback.is_playing = false;
            self.notices.push(Notice::PlaybackFailed(e.to_string()));
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored key");
                None
            }
        }
    }

    fn persist_tracks(&mut self) {
        let blobs: Vec<&Blob> = self.tracks.iter().map(|t| &t.blob).collect();
        let result = store::encode_tracks(&blobs)
            .map_err(store::StoreError::from)
            .and_then(|raw| self.store.set(&self.options.keys.tracks, &raw));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist track list");
            self.notices.push(Notice::StorageFailed(e.to_string()));
        }
    }

    fn persist_index(&mut self) {
        let raw = store::encode_index(self.playback.current_index);
        if let Err(e) = self.store.set(&self.options.keys.index, &raw) {
            tracing::warn!(error = %e, "failed to persist track index");
            self.notices.push(Notice::StorageFailed(e.to_string()));
        }
    }
}
