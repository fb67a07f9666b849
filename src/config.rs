//! Runtime configuration.
//!
//! Defaults come from XDG directories; `PGAL_*` environment variables override
//! them and command-line flags override the environment.

use std::path::PathBuf;

use anyhow::Result;

use crate::models::DEFAULT_STORAGE_KEY;
use crate::storage::SqliteBackend;

/// Browser localStorage budget the gallery was sized for.
pub const DEFAULT_QUOTA_KB: usize = 5 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryConfig {
    /// SQLite database holding the persistence slot.
    pub db_path: PathBuf,
    /// Name of the slot holding the record list.
    pub storage_key: String,
    /// Largest serialized record list the backend accepts.
    pub quota_bytes: usize,
    /// Base directory seeded candidate paths are resolved against.
    pub asset_root: PathBuf,
}

impl GalleryConfig {
    /// Builds the configuration from defaults and `PGAL_*` variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match non_empty(lookup("PGAL_DB")) {
            Some(path) => PathBuf::from(path),
            None => SqliteBackend::default_db_path()?,
        };

        let storage_key =
            non_empty(lookup("PGAL_STORAGE_KEY")).unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        let quota_bytes = lookup("PGAL_QUOTA_KB")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .and_then(|kb| kb.checked_mul(1024))
            .unwrap_or(DEFAULT_QUOTA_KB * 1024);

        let asset_root = non_empty(lookup("PGAL_ASSET_ROOT"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            db_path,
            storage_key,
            quota_bytes,
            asset_root,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
