use std::path::PathBuf;

use crate::config;
use crate::media::PlaybackElement;
use crate::playlist::{ControllerOptions, PlaylistController};
use crate::store::{JsonFileStore, MemoryStore, SnapshotKeys, Store};
use crate::upload;

/// Build the controller options from the player and storage settings.
pub fn controller_options(settings: &config::Settings) -> ControllerOptions {
    ControllerOptions {
        enable_seek_bar: settings.player.enable_seek_bar,
        track_play_start_event: settings.player.track_play_start_event,
        keys: SnapshotKeys {
            tracks: settings.storage.tracks_key.clone(),
            index: settings.storage.index_key.clone(),
        },
    }
}

/// Pick the store backend: a file when a location is known, memory otherwise.
pub fn open_store(settings: &config::Settings, ephemeral: bool) -> Box<dyn Store> {
    if ephemeral {
        tracing::info!("ephemeral session; playlist will not be saved");
        return Box::new(MemoryStore::new());
    }
    match settings.storage_path() {
        Some(path) => {
            let store = JsonFileStore::open(path);
            tracing::info!(path = %store.path().display(), "using store file");
            Box::new(store)
        }
        None => {
            tracing::warn!("no data directory; playlist will not be saved");
            Box::new(MemoryStore::new())
        }
    }
}

/// Bring the controller to its starting state and upload files given on the command line.
///
/// Returns the number of tracks added from `paths`.
pub fn prepare<S: Store, E: PlaybackElement>(
    deck: &mut PlaylistController<S, E>,
    settings: &config::Settings,
    reset: bool,
    paths: &[PathBuf],
) -> usize {
    if reset {
        deck.reset();
    } else {
        deck.restore_from_storage();
    }

    if paths.is_empty() {
        return 0;
    }
    let blobs = upload::collect(paths, &settings.upload);
    deck.upload_files(blobs)
}
