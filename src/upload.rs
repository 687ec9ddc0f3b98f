//! Upload surface: turn user-selected paths into blobs.
//!
//! Files are taken in the order given. Directories are walked and their
//! audio files appended sorted by path. The extension filter plays the role
//! of the picker's audio type filter; the controller itself does not care.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::blob::Blob;
use crate::config::UploadSettings;

fn is_audio_file(path: &Path, settings: &UploadSettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn walk_dir(dir: &Path, settings: &UploadSettings) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);
    // Non-recursive = only the root directory.
    if !settings.recursive {
        walker = walker.max_depth(1);
    }

    let mut found: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_audio_file(p, settings))
        .collect();
    found.sort();
    found
}

/// Split a line of user input into paths. Quotes group paths with spaces.
pub fn split_input(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => cur.push(c),
            (None, '"' | '\'') => quote = Some(c),
            (None, c) if c.is_whitespace() => {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
            }
            (None, c) => cur.push(c),
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

/// Resolve `paths` into blobs ready for `PlaylistController::upload_files`.
///
/// Files named explicitly are accepted whatever their extension.
pub fn collect<P: AsRef<Path>>(paths: &[P], settings: &UploadSettings) -> Vec<Blob> {
    let mut blobs = Vec::new();
    for p in paths {
        let path = p.as_ref();
        if path.is_dir() {
            let found = walk_dir(path, settings);
            tracing::debug!(dir = %path.display(), files = found.len(), "scanned upload directory");
            blobs.extend(found.into_iter().map(Blob::from_path));
        } else if path.is_file() {
            blobs.push(Blob::from_path(path));
        } else {
            tracing::warn!(path = %path.display(), "skipping upload path that does not exist");
        }
    }
    blobs
}
