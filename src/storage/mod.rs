//! Persistence backends for the gallery's single key-value slot.
//!
//! - `MemoryBackend` - in-process slots with an optional byte quota
//! - `SqliteBackend` - SQLite table of slots at `XDG_CONFIG_HOME/pgal/gallery.sqlite`
//!
//! Every `set` replaces the slot's previous value wholesale.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Failure reported by a backend write or read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("quota exceeded: {attempted_bytes} bytes > limit {limit_bytes}")]
    QuotaExceeded {
        attempted_bytes: usize,
        limit_bytes: usize,
    },
    #[error("{0}")]
    Other(String),
}

/// A swappable store offering `get` and `set` on named string slots.
pub trait PersistenceBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Drops the slot entirely. Absent keys are not an error.
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

/// Rejects values larger than `limit` bytes.
pub(crate) fn check_quota(value: &str, limit: Option<usize>) -> Result<(), BackendError> {
    match limit {
        Some(limit_bytes) if value.len() > limit_bytes => Err(BackendError::QuotaExceeded {
            attempted_bytes: value.len(),
            limit_bytes,
        }),
        _ => Ok(()),
    }
}
