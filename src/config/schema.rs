use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::SnapshotKeys;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/playdeck/config.toml` or `~/.config/playdeck/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `PLAYDECK__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub player: PlayerSettings,
    pub storage: StorageSettings,
    pub upload: UploadSettings,
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub logging: LoggingSettings,
}

/// Switches between the minimal player and the richer one.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Show the progress bar and allow seeking on it.
    pub enable_seek_bar: bool,
    /// Count the element's own "play" event as playback being active.
    pub track_play_start_event: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            enable_seek_bar: true,
            track_play_start_event: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Store file. Defaults to `$XDG_DATA_HOME/playdeck/storage.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Key holding the serialized track list.
    pub tracks_key: String,
    /// Key holding the current track index.
    pub index_key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let keys = SnapshotKeys::default();
        Self {
            path: None,
            tracks_key: keys.tracks,
            index_key: keys.index,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadSettings {
    /// File extensions picked up when uploading a directory (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to follow symlinks while walking directories.
    pub follow_links: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "m4a".into(),
            ],
            recursive: true,
            include_hidden: false,
            follow_links: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Interval between progress reports while playing (milliseconds).
    pub time_update_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            quit_fade_out_ms: 500,
            time_update_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// How long a notice stays in the status area (milliseconds).
    pub notice_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ Audio Player ~ ".to_string(),
            notice_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { scrub_seconds: 5 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive, e.g. `info` or `playdeck=debug`.
    /// `PLAYDECK_LOG` overrides it.
    pub filter: String,
    /// Directory for `playdeck.log`. Defaults to the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            dir: None,
        }
    }
}
