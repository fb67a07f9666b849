use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif" => Some(Self::Image),
            "webm" | "mp4" | "mkv" | "avi" | "mov" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Derives the kind from a declared MIME-like type (`image/*` or `video/*`).
    pub fn from_declared_type(declared: &str) -> Option<Self> {
        if declared.starts_with("image/") {
            Some(Self::Image)
        } else if declared.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Fresh `<prefix>_<uuid>` id.
pub fn new_record_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Provenance of a record and where its content lives.
///
/// Uploaded records carry their bytes as an embedded data URL; seeded records
/// only reference the probed path. Keeping both in one enum means a record can
/// never hold both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "camelCase")]
pub enum MediaSource {
    #[serde(rename_all = "camelCase")]
    Uploaded { payload: String },
    #[serde(rename_all = "camelCase")]
    Seeded { source_path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Uploaded,
    Seeded,
}

/// One gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub name: String,
    pub kind: MediaKind,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub source: MediaSource,
}

impl MediaRecord {
    /// Create an uploaded record with a fresh id.
    pub fn uploaded(name: impl Into<String>, kind: MediaKind, payload: String, size_bytes: u64) -> Self {
        Self {
            id: new_record_id("upload"),
            name: name.into(),
            kind,
            size_bytes,
            created_at: Utc::now(),
            source: MediaSource::Uploaded { payload },
        }
    }

    /// Create a seeded record; size is unknown for reference entries.
    pub fn seeded(name: impl Into<String>, kind: MediaKind, source_path: impl Into<String>) -> Self {
        Self {
            id: new_record_id("folder"),
            name: name.into(),
            kind,
            size_bytes: 0,
            created_at: Utc::now(),
            source: MediaSource::Seeded {
                source_path: source_path.into(),
            },
        }
    }

    pub fn origin(&self) -> Origin {
        match self.source {
            MediaSource::Uploaded { .. } => Origin::Uploaded,
            MediaSource::Seeded { .. } => Origin::Seeded,
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.origin() == Origin::Seeded
    }

    /// The probed path, present only for seeded records.
    pub fn source_path(&self) -> Option<&str> {
        match &self.source {
            MediaSource::Seeded { source_path } => Some(source_path),
            MediaSource::Uploaded { .. } => None,
        }
    }

    /// Embedded data URL, present only for uploaded records.
    pub fn payload(&self) -> Option<&str> {
        match &self.source {
            MediaSource::Uploaded { payload } => Some(payload),
            MediaSource::Seeded { .. } => None,
        }
    }
}

/// View predicate applied to the record list without mutating it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MediaFilter {
    #[default]
    All,
    Images,
    Videos,
}

impl MediaFilter {
    pub fn matches(&self, record: &MediaRecord) -> bool {
        match self {
            Self::All => true,
            Self::Images => record.kind == MediaKind::Image,
            Self::Videos => record.kind == MediaKind::Video,
        }
    }

    /// Message shown when the filtered view is empty.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::All => "No media has been uploaded yet.",
            Self::Images => "No images have been uploaded yet.",
            Self::Videos => "No videos have been uploaded yet.",
        }
    }
}

/// Human-readable byte count using 1024 steps.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exp])
}
