//! SQLite-backed persistence slots.
//!
//! The database is stored at `XDG_CONFIG_HOME/pgal/gallery.sqlite` by default and
//! holds one row per named slot. Writes are upserts, so each `set` fully
//! replaces the previous contents of that slot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use super::{check_quota, BackendError, PersistenceBackend};

pub struct SqliteBackend {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteBackend {
    /// Returns the default database path based on XDG directories.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "pgal").context("Failed to determine project directories")?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

        Ok(config_dir.join("gallery.sqlite"))
    }

    /// Opens or creates the database at the specified path.
    pub fn open(path: &Path, quota_bytes: Option<usize>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )
        .context("Failed to configure SQLite pragmas")?;

        let backend = Self::from_connection(conn, quota_bytes)?;
        info!("Opened gallery database at {:?}", path);
        Ok(backend)
    }

    /// In-memory database for tests.
    #[cfg(test)]
    pub fn open_in_memory(quota_bytes: Option<usize>) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn, quota_bytes)
    }

    fn from_connection(conn: Connection, quota_bytes: Option<usize>) -> Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )
        .context("Failed to create database tables")?;

        debug!("Slot table created/verified");
        Ok(Self { conn, quota_bytes })
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

fn map_sqlite_error(err: rusqlite::Error, attempted_bytes: usize) -> BackendError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DiskFull) | Some(ErrorCode::TooBig) => BackendError::QuotaExceeded {
            attempted_bytes,
            limit_bytes: 0,
        },
        _ => BackendError::Other(err.to_string()),
    }
}

impl PersistenceBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| BackendError::Other(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        check_quota(value, self.quota_bytes)?;

        self.conn
            .execute(
                "
            INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
                params![key, value, Self::now()],
            )
            .map_err(|e| map_sqlite_error(e, value.len()))?;

        debug!(key, bytes = value.len(), "Wrote slot");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.conn
            .execute("DELETE FROM slots WHERE key = ?1", params![key])
            .map_err(|e| BackendError::Other(e.to_string()))?;
        Ok(())
    }
}
