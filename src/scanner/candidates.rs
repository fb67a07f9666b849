//! Candidate paths for seeded media.
//!
//! Two sources are available:
//! - `guess_candidates` - a fixed list of likely filenames under `assets/`
//! - `directory_candidates` - an actual listing of the asset folders via walkdir
//!
//! Candidate paths are relative to the asset root and use `/` separators so
//! they stay stable in the persisted record list.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::models::MediaKind;

/// Folders under the asset root that hold seeded media.
pub const ASSET_DIRS: [&str; 2] = ["assets/images", "assets/video"];

/// How many numbered variants of each guessed filename are tried.
const GUESS_COUNT: usize = 10;

/// A path that may or may not exist, with the record fields it would produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub name: String,
    pub kind: MediaKind,
}

impl Candidate {
    pub fn new(path: impl Into<String>, name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind,
        }
    }
}

/// The fixed guess list: one known file, then numbered patterns.
pub fn guess_candidates() -> Vec<Candidate> {
    let patterns: [(&str, &str, &str, MediaKind); 6] = [
        ("assets/video", "video", "mp4", MediaKind::Video),
        ("assets/video", "sample", "mp4", MediaKind::Video),
        ("assets/video", "test", "mp4", MediaKind::Video),
        ("assets/images", "image", "jpg", MediaKind::Image),
        ("assets/images", "photo", "jpg", MediaKind::Image),
        ("assets/images", "sample", "png", MediaKind::Image),
    ];

    let mut candidates = Vec::with_capacity(1 + patterns.len() * GUESS_COUNT);
    candidates.push(Candidate::new(
        "assets/video/video1-1.mp4",
        "video1-1.mp4",
        MediaKind::Video,
    ));

    for (dir, stem, ext, kind) in patterns {
        for i in 1..=GUESS_COUNT {
            let name = format!("{stem}{i}.{ext}");
            candidates.push(Candidate::new(format!("{dir}/{name}"), name, kind));
        }
    }

    candidates
}

/// Lists media files that actually exist in the asset folders under `root`.
///
/// Missing folders are skipped. Results are sorted by path.
pub fn directory_candidates(root: &Path) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for dir in ASSET_DIRS {
        let base = root.join(dir);
        if !base.is_dir() {
            debug!(?base, "Asset folder missing, skipping");
            continue;
        }

        for entry in WalkDir::new(&base).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let Some(kind) = MediaKind::from_path(path) else {
                continue; // Skip non-media files
            };

            let Ok(relative) = path.strip_prefix(root) else {
                warn!(?path, "Listed file outside asset root");
                continue;
            };

            let rel = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let name = entry.file_name().to_string_lossy().to_string();

            candidates.push(Candidate::new(rel, name, kind));
        }
    }

    // Sort by path for consistent ordering
    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = candidates.len(), "Listed asset candidates");
    candidates
}
