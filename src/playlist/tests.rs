use super::*;
use crate::blob::{Blob, UrlMinter};
use crate::media::{ElementError, MediaEvent, PlaybackElement};
use crate::store::{MemoryStore, SnapshotKeys, Store, StoreError, encode_tracks};
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mints a URL for any blob whose path does not contain "missing".
#[derive(Default)]
struct FakeMinter {
    next: AtomicU64,
    live: Mutex<HashSet<String>>,
}

impl FakeMinter {
    fn live(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}

impl UrlMinter for FakeMinter {
    fn create(&self, blob: &Blob) -> Option<String> {
        if blob.path.to_string_lossy().contains("missing") {
            return None;
        }
        let url = format!("fake:{}", self.next.fetch_add(1, Ordering::Relaxed));
        self.live.lock().unwrap().insert(url.clone());
        Some(url)
    }

    fn revoke(&self, url: &str) {
        assert!(self.live.lock().unwrap().remove(url), "double revoke of {url}");
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    SetSrc(Option<String>),
    Play,
    Pause,
    Seek(Duration),
}

#[derive(Default)]
struct FakeElement {
    src: Option<String>,
    calls: Vec<Call>,
    events: VecDeque<MediaEvent>,
    duration: Option<Duration>,
    position: Duration,
    playing: bool,
    reject_play: bool,
}

impl FakeElement {
    fn plays(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Play).count()
    }

    fn pauses(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Pause).count()
    }
}

impl PlaybackElement for FakeElement {
    fn set_src(&mut self, url: Option<&str>) {
        self.src = url.map(str::to_string);
        self.position = Duration::ZERO;
        self.playing = false;
        self.events.clear();
        self.calls.push(Call::SetSrc(self.src.clone()));
    }

    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn play(&mut self) -> Result<(), ElementError> {
        self.calls.push(Call::Play);
        if self.reject_play {
            return Err(ElementError::Rejected("autoplay blocked".into()));
        }
        if self.src.is_none() {
            return Err(ElementError::NoSource);
        }
        self.playing = true;
        self.events.push_back(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
        self.playing = false;
        self.events.push_back(MediaEvent::Pause);
    }

    fn paused(&self) -> bool {
        !self.playing
    }

    fn current_time(&self) -> Duration {
        self.position
    }

    fn set_current_time(&mut self, at: Duration) {
        self.position = at;
        self.calls.push(Call::Seek(at));
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }
}

/// Store whose writes can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: bool,
}

impl Store for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(std::io::Error::other("quota exceeded")));
        }
        self.inner.set(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }
}

type Controller<S = MemoryStore> = PlaylistController<S, FakeElement>;

fn blob(name: &str) -> Blob {
    Blob::from_path(format!("/music/{name}"))
}

fn blobs(names: &[&str]) -> Vec<Blob> {
    names.iter().map(|n| blob(n)).collect()
}

fn controller_with(store: MemoryStore, options: ControllerOptions) -> (Controller, Arc<FakeMinter>) {
    let minter = Arc::new(FakeMinter::default());
    let c = PlaylistController::new(store, FakeElement::default(), minter.clone(), options);
    (c, minter)
}

fn controller() -> (Controller, Arc<FakeMinter>) {
    controller_with(MemoryStore::new(), ControllerOptions::default())
}

fn names<S: Store>(c: &PlaylistController<S, FakeElement>) -> Vec<String> {
    c.tracks().iter().map(|t| t.name().to_string()).collect()
}

fn stored_store(tracks: &[&str], index: Option<&str>) -> MemoryStore {
    let keys = SnapshotKeys::default();
    let bs = blobs(tracks);
    let refs: Vec<&Blob> = bs.iter().collect();
    let mut store = MemoryStore::new();
    store.set(&keys.tracks, &encode_tracks(&refs).unwrap()).unwrap();
    if let Some(i) = index {
        store.set(&keys.index, i).unwrap();
    }
    store
}

#[test]
fn uploads_append_in_order() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3"]));
    c.upload_files(blobs(&["b.mp3"]));
    c.upload_files(blobs(&["c.mp3"]));

    assert_eq!(names(&c), vec!["a.mp3", "b.mp3", "c.mp3"]);
    assert_eq!(c.state(), PlayerState::LoadedPaused);
}

#[test]
fn uploads_keep_duplicates() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "a.mp3"]));
    c.upload_files(blobs(&["a.mp3"]));
    assert_eq!(c.len(), 3);
}

#[test]
fn upload_remints_every_url_and_releases_the_old_ones() {
    let (mut c, minter) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    let before: Vec<String> = c.tracks().iter().map(|t| t.url().unwrap().to_string()).collect();

    c.upload_files(blobs(&["c.mp3"]));
    let after: Vec<String> = c.tracks().iter().map(|t| t.url().unwrap().to_string()).collect();

    assert_eq!(after.len(), 3);
    assert!(before.iter().all(|u| !after.contains(u)));
    assert_eq!(minter.live(), 3);
}

#[test]
fn upload_persists_tracks_and_index() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));

    let keys = SnapshotKeys::default();
    let raw = c.store().get(&keys.tracks).unwrap().unwrap();
    let stored = crate::store::decode_tracks(Some(&raw)).unwrap();
    assert_eq!(stored, blobs(&["a.mp3", "b.mp3"]));
    assert_eq!(c.store().get(&keys.index).unwrap().as_deref(), Some("0"));
}

#[test]
fn upload_while_playing_pauses_and_keeps_index() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    c.select_track(1).unwrap();
    c.pump_events();
    assert_eq!(c.state(), PlayerState::LoadedPlaying);

    c.upload_files(blobs(&["c.mp3"]));
    c.pump_events();

    assert_eq!(c.state(), PlayerState::LoadedPaused);
    assert_eq!(c.current_index(), 1);
    assert_eq!(c.element().src(), c.tracks()[1].url());
}

#[test]
fn upload_of_nothing_is_a_noop() {
    let (mut c, _) = controller();
    assert_eq!(c.upload_files(Vec::new()), 0);
    assert!(c.store().is_empty());
    assert_eq!(c.state(), PlayerState::Idle);
}

#[test]
fn upload_keeps_track_without_url() {
    let (mut c, minter) = controller();
    c.upload_files(blobs(&["missing.mp3", "b.mp3"]));
    assert_eq!(c.len(), 2);
    assert_eq!(c.tracks()[0].url(), None);
    assert_eq!(minter.live(), 1);
}

#[test]
fn restore_reproduces_persisted_names() {
    let (mut first, _) = controller();
    first.upload_files(blobs(&["x.mp3", "y.mp3", "x.mp3"]));
    let store = first.store().clone();

    let (mut c, _) = controller_with(store, ControllerOptions::default());
    c.restore_from_storage();
    assert_eq!(names(&c), vec!["x.mp3", "y.mp3", "x.mp3"]);
    assert!(c.notices().is_empty());
}

#[test]
fn restore_treats_malformed_track_list_as_empty() {
    let keys = SnapshotKeys::default();
    for raw in [None, Some("null"), Some("{}"), Some("\"a.mp3\""), Some("[oops")] {
        let mut store = MemoryStore::new();
        if let Some(raw) = raw {
            store.set(&keys.tracks, raw).unwrap();
        }
        let (mut c, _) = controller_with(store, ControllerOptions::default());
        c.restore_from_storage();
        assert!(c.is_empty(), "value {raw:?}");
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.state(), PlayerState::Idle);
    }
}

#[test]
fn restore_drops_entries_without_playable_url() {
    let store = stored_store(&["a.mp3", "missing.mp3", "c.mp3"], Some("1"));
    let (mut c, minter) = controller_with(store, ControllerOptions::default());
    c.restore_from_storage();

    assert_eq!(names(&c), vec!["a.mp3", "c.mp3"]);
    assert!(c.tracks().iter().all(|t| t.url().is_some()));
    assert_eq!(minter.live(), 2);
    assert_eq!(c.current_index(), 1);
}

#[test]
fn restore_reads_index_as_integer() {
    let store = stored_store(&["a.mp3", "b.mp3", "c.mp3"], Some("2"));
    let (mut c, _) = controller_with(store, ControllerOptions::default());
    c.restore_from_storage();
    assert_eq!(c.current_index(), 2);
    assert!(!c.is_playing());
    assert_eq!(c.element().src(), c.tracks()[2].url());
}

#[test]
fn restore_ignores_unparsable_index() {
    let store = stored_store(&["a.mp3", "b.mp3"], Some("two"));
    let (mut c, _) = controller_with(store, ControllerOptions::default());
    c.restore_from_storage();
    assert_eq!(c.current_index(), 0);
    assert!(c.notices().is_empty());
}

#[test]
fn restore_clamps_out_of_range_index_and_reports_it() {
    let store = stored_store(&["a.mp3", "b.mp3"], Some("7"));
    let (mut c, _) = controller_with(store, ControllerOptions::default());
    c.restore_from_storage();

    assert_eq!(c.current_index(), 1);
    assert_eq!(c.notices(), &[Notice::IndexOutOfRange { index: 7, len: 2 }]);
    let keys = SnapshotKeys::default();
    assert_eq!(c.store().get(&keys.index).unwrap().as_deref(), Some("1"));
}

#[test]
fn restore_with_index_but_no_tracks_is_idle() {
    let keys = SnapshotKeys::default();
    let mut store = MemoryStore::new();
    store.set(&keys.index, "3").unwrap();
    let (mut c, _) = controller_with(store, ControllerOptions::default());
    c.restore_from_storage();
    assert_eq!(c.state(), PlayerState::Idle);
    assert_eq!(c.current_index(), 0);
}

#[test]
fn torn_snapshot_new_list_with_stale_index_restores_cleanly() {
    // The list was shortened but the index write never landed.
    let store = stored_store(&["a.mp3"], Some("4"));
    let (mut c, _) = controller_with(store, ControllerOptions::default());
    c.restore_from_storage();
    assert_eq!(c.current_index(), 0);
    assert_eq!(c.len(), 1);
}

#[test]
fn torn_snapshot_stale_list_with_new_index_restores_cleanly() {
    // The index moved but the list write carrying the new tracks failed.
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    let mut store = c.store().clone();
    store.set(&SnapshotKeys::default().index, "2").unwrap();

    let (mut restored, _) = controller_with(store, ControllerOptions::default());
    restored.restore_from_storage();
    assert_eq!(restored.current_index(), 1);
    assert_eq!(restored.len(), 2);
}

#[test]
fn failed_writes_become_notices_not_errors() {
    let minter = Arc::new(FakeMinter::default());
    let store = FlakyStore {
        fail_writes: true,
        ..FlakyStore::default()
    };
    let mut c = PlaylistController::new(
        store,
        FakeElement::default(),
        minter,
        ControllerOptions::default(),
    );
    c.upload_files(blobs(&["a.mp3"]));

    assert_eq!(c.len(), 1);
    assert!(
        c.notices()
            .iter()
            .all(|n| matches!(n, Notice::StorageFailed(_)))
    );
    assert_eq!(c.take_notices().len(), 2);
    assert!(c.notices().is_empty());
}

#[test]
fn select_track_plays_the_chosen_index() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3", "c.mp3"]));
    c.select_track(2).unwrap();

    assert_eq!(c.current_index(), 2);
    assert!(c.is_playing());
    assert_eq!(c.element().src(), c.tracks()[2].url());
    assert_eq!(c.element().plays(), 1);

    let keys = SnapshotKeys::default();
    assert_eq!(c.store().get(&keys.index).unwrap().as_deref(), Some("2"));
}

#[test]
fn select_track_out_of_range_changes_nothing() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    let before = c.playback();

    assert_eq!(
        c.select_track(2),
        Err(PlaylistError::IndexOutOfRange { index: 2, len: 2 })
    );
    assert_eq!(c.playback(), before);
    assert_eq!(c.element().plays(), 0);
}

#[test]
fn select_track_on_empty_playlist_is_rejected() {
    let (mut c, _) = controller();
    assert!(c.select_track(0).is_err());
    assert_eq!(c.state(), PlayerState::Idle);
}

#[test]
fn rejected_play_is_a_notice_and_stops_playing() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3"]));
    let mut element = FakeElement::default();
    element.reject_play = true;
    let mut c = PlaylistController::new(
        c.store().clone(),
        element,
        Arc::new(FakeMinter::default()),
        ControllerOptions::default(),
    );
    c.restore_from_storage();

    assert!(c.select_track(0).is_ok());
    assert!(!c.is_playing());
    assert!(matches!(c.notices(), [Notice::PlaybackFailed(_)]));
}

#[test]
fn ended_advances_then_wraps() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    c.select_track(0).unwrap();

    c.on_playback_ended();
    assert_eq!(c.current_index(), 1);
    assert!(c.is_playing());

    c.on_playback_ended();
    assert_eq!(c.current_index(), 0);
    assert!(c.is_playing());
    assert_eq!(c.element().plays(), 3);
}

#[test]
fn ended_while_paused_moves_without_playing() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    c.on_playback_ended();
    assert_eq!(c.current_index(), 1);
    assert!(!c.is_playing());
    assert_eq!(c.element().plays(), 0);
}

#[test]
fn single_track_loops_on_end() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3"]));
    c.select_track(0).unwrap();
    c.on_playback_ended();

    assert_eq!(c.current_index(), 0);
    assert_eq!(c.element().plays(), 2);
}

#[test]
fn ended_on_empty_playlist_is_ignored() {
    let (mut c, _) = controller();
    c.on_playback_ended();
    assert_eq!(c.state(), PlayerState::Idle);
}

#[test]
fn pause_event_stops_playing() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3"]));
    c.select_track(0).unwrap();
    c.handle_event(MediaEvent::Pause);
    assert_eq!(c.state(), PlayerState::LoadedPaused);
}

#[test]
fn play_event_is_tracked_only_when_enabled() {
    let (mut rich, _) = controller();
    rich.upload_files(blobs(&["a.mp3"]));
    rich.handle_event(MediaEvent::Play);
    assert!(rich.is_playing());

    let (mut minimal, _) = controller_with(
        MemoryStore::new(),
        ControllerOptions {
            track_play_start_event: false,
            ..ControllerOptions::default()
        },
    );
    minimal.upload_files(blobs(&["a.mp3"]));
    minimal.handle_event(MediaEvent::Play);
    assert!(!minimal.is_playing());
}

#[test]
fn toggle_playback_follows_element_events() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3"]));

    c.toggle_playback();
    c.pump_events();
    assert!(c.is_playing());

    c.toggle_playback();
    c.pump_events();
    assert!(!c.is_playing());
    assert_eq!(c.element().pauses(), 1);
}

#[test]
fn toggle_keeps_working_without_play_tracking() {
    let (mut c, _) = controller_with(
        MemoryStore::new(),
        ControllerOptions {
            track_play_start_event: false,
            ..ControllerOptions::default()
        },
    );
    c.upload_files(blobs(&["a.mp3"]));
    c.select_track(0).unwrap();
    c.pump_events();

    for _ in 0..3 {
        c.toggle_playback();
        c.pump_events();
    }
    assert_eq!(c.element().pauses(), 2);
    assert_eq!(c.element().plays(), 2);
    assert!(c.element().paused());
}

#[test]
fn upload_pauses_a_resumed_element_without_play_tracking() {
    let (mut c, _) = controller_with(
        MemoryStore::new(),
        ControllerOptions {
            track_play_start_event: false,
            ..ControllerOptions::default()
        },
    );
    c.upload_files(blobs(&["a.mp3"]));
    c.toggle_playback();
    c.pump_events();
    assert!(!c.is_playing());
    assert!(!c.element().paused());

    c.upload_files(blobs(&["b.mp3"]));
    assert_eq!(c.element().pauses(), 1);
    assert!(c.element().paused());
}

#[test]
fn ended_from_previous_source_does_not_skip_selection() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3", "c.mp3", "d.mp3"]));
    c.select_track(0).unwrap();
    c.element_mut().events.push_back(MediaEvent::Ended);

    c.select_track(2).unwrap();
    c.pump_events();

    assert_eq!(c.current_index(), 2);
    assert!(c.is_playing());
}

#[test]
fn time_updates_are_recorded() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3"]));
    c.handle_event(MediaEvent::TimeUpdate(Duration::from_secs(12)));
    assert_eq!(c.current_time(), Duration::from_secs(12));
}

#[test]
fn element_errors_become_notices() {
    let (mut c, _) = controller();
    c.handle_event(MediaEvent::Error("cannot decode".into()));
    assert_eq!(
        c.notices(),
        &[Notice::PlaybackFailed("cannot decode".into())]
    );
}

#[test]
fn seek_maps_fraction_onto_duration() {
    let minter = Arc::new(FakeMinter::default());
    let element = FakeElement {
        duration: Some(Duration::from_secs(200)),
        ..FakeElement::default()
    };
    let mut c = PlaylistController::new(
        MemoryStore::new(),
        element,
        minter,
        ControllerOptions::default(),
    );
    c.upload_files(blobs(&["a.mp3"]));

    assert_eq!(c.seek_to(0.25), Ok(Duration::from_secs(50)));
    assert_eq!(c.current_time(), Duration::from_secs(50));
    assert_eq!(c.element().current_time(), Duration::from_secs(50));

    assert_eq!(c.seek_to(1.5), Ok(Duration::from_secs(200)));
    assert_eq!(c.seek_to(-1.0), Ok(Duration::ZERO));
    assert_eq!(c.seek_to(f64::NAN), Err(PlaylistError::SeekUnavailable));
}

#[test]
fn seek_is_unavailable_without_duration_or_when_disabled() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3"]));
    assert_eq!(c.seek_to(0.5), Err(PlaylistError::SeekUnavailable));

    let element = FakeElement {
        duration: Some(Duration::from_secs(10)),
        ..FakeElement::default()
    };
    let mut c = PlaylistController::new(
        MemoryStore::new(),
        element,
        Arc::new(FakeMinter::default()),
        ControllerOptions {
            enable_seek_bar: false,
            ..ControllerOptions::default()
        },
    );
    c.upload_files(blobs(&["a.mp3"]));
    assert_eq!(c.seek_to(0.5), Err(PlaylistError::SeekUnavailable));
}

#[test]
fn reset_clears_everything() {
    let (mut c, minter) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    c.select_track(1).unwrap();

    c.reset();

    assert!(c.is_empty());
    assert_eq!(c.current_index(), 0);
    assert!(!c.is_playing());
    assert_eq!(c.state(), PlayerState::Idle);
    assert_eq!(c.element().pauses(), 1);
    assert_eq!(c.element().src(), None);
    assert_eq!(minter.live(), 0);

    let keys = SnapshotKeys::default();
    assert!(!c.store().contains(&keys.tracks));
    assert!(!c.store().contains(&keys.index));
}

#[test]
fn reset_on_idle_is_idempotent() {
    let (mut c, _) = controller();
    c.reset();
    c.reset();
    assert_eq!(c.state(), PlayerState::Idle);
    assert_eq!(c.playback(), PlaybackState::default());
    assert!(c.element().calls.is_empty());
    assert!(c.notices().is_empty());
}

#[test]
fn scenario_two_uploads_advance_and_wrap() {
    let (mut c, _) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    c.select_track(0).unwrap();
    c.on_playback_ended();
    assert_eq!(c.current_index(), 1);
    c.on_playback_ended();
    assert_eq!(c.current_index(), 0);
}

#[test]
fn dropping_the_controller_releases_all_urls() {
    let (mut c, minter) = controller();
    c.upload_files(blobs(&["a.mp3", "b.mp3"]));
    assert_eq!(minter.live(), 2);
    drop(c);
    assert_eq!(minter.live(), 0);
}

#[test]
fn restored_index_round_trips_for_large_values() {
    let names: Vec<String> = (0..=10_000).map(|i| format!("t{i}.mp3")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let store = stored_store(&refs, Some("10000"));

    let (mut c, _) = controller_with(store, ControllerOptions::default());
    c.restore_from_storage();
    assert_eq!(c.current_index(), 10_000);
}

proptest! {
    #[test]
    fn index_codec_round_trips(k in 0usize..=10_000) {
        let raw = crate::store::encode_index(k);
        prop_assert_eq!(crate::store::decode_index(Some(&raw)), Some(k));
    }

    #[test]
    fn restore_reproduces_any_uploaded_sequence(
        list in proptest::collection::vec("[a-z]{1,8}\\.mp3", 0..20),
    ) {
        let (mut first, _) = controller();
        first.upload_files(list.iter().map(|n| blob(n)));
        let (mut c, _) = controller_with(first.store().clone(), ControllerOptions::default());
        c.restore_from_storage();
        prop_assert_eq!(names(&c), list);
    }

    #[test]
    fn index_stays_valid_under_any_event_sequence(
        sizes in proptest::collection::vec(0usize..4, 1..5),
        ops in proptest::collection::vec(0u8..5, 0..40),
    ) {
        let (mut c, minter) = controller();
        let mut next = 0usize;
        let mut sizes = sizes.into_iter();
        for op in ops {
            match op {
                0 => {
                    let n = sizes.next().unwrap_or(1);
                    c.upload_files((0..n).map(|_| { next += 1; blob(&format!("{next}.mp3")) }));
                }
                1 => { let _ = c.select_track(next % 5); }
                2 => c.on_playback_ended(),
                3 => c.handle_event(MediaEvent::Pause),
                _ => c.reset(),
            }
            c.pump_events();
            if c.is_empty() {
                prop_assert_eq!(c.current_index(), 0);
                prop_assert!(!c.is_playing());
            } else {
                prop_assert!(c.current_index() < c.len());
            }
            prop_assert_eq!(minter.live(), c.len());
        }
    }
}
