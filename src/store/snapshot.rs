//! Encoding of the persisted playlist: a track list and a current index,
//! stored under two independent keys.

use serde_json::Value;

use crate::blob::Blob;

/// Names of the two keys the playlist is persisted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotKeys {
    pub tracks: String,
    pub index: String,
}

impl Default for SnapshotKeys {
    fn default() -> Self {
        Self {
            tracks: "playdeck.tracks".to_string(),
            index: "playdeck.current_index".to_string(),
        }
    }
}

/// Serialize the track list as a JSON array of `{name, path}` records.
pub fn encode_tracks(blobs: &[&Blob]) -> Result<String, serde_json::Error> {
    serde_json::to_string(blobs)
}

/// Decode a persisted track list.
///
/// Returns `None` when the value is absent, not JSON, `null`, or not an
/// array. Array entries that are not track records are skipped.
pub fn decode_tracks(raw: Option<&str>) -> Option<Vec<Blob>> {
    let value: Value = serde_json::from_str(raw?).ok()?;
    let Value::Array(items) = value else {
        return None;
    };

    let total = items.len();
    let blobs: Vec<Blob> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Blob>(item).ok())
        .collect();
    if blobs.len() != total {
        tracing::debug!(skipped = total - blobs.len(), "skipped malformed track entries");
    }
    Some(blobs)
}

pub fn encode_index(index: usize) -> String {
    index.to_string()
}

/// Parse a persisted index. Anything but a plain non-negative integer is `None`.
pub fn decode_index(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse::<usize>().ok()
}
