//! Error types surfaced by the media store.

use crate::storage::BackendError;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Declared type is neither `image/*` nor `video/*`.
    #[error("unsupported file type for '{name}': {declared_type}")]
    UnsupportedType { name: String, declared_type: String },

    /// File content could not be read into an embedded payload.
    #[error("failed to read '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The persistence backend rejected the write for size reasons.
    /// The in-memory list is left intact.
    #[error("storage quota exceeded writing '{key}' ({attempted_bytes} bytes)")]
    QuotaExceeded { key: String, attempted_bytes: usize },

    /// Import payload is malformed; nothing was merged.
    #[error("invalid backup format: {0}")]
    InvalidFormat(String),

    #[error("persistence backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn from_backend(key: &str, err: BackendError) -> Self {
        match err {
            BackendError::QuotaExceeded { attempted_bytes, .. } => Self::QuotaExceeded {
                key: key.to_string(),
                attempted_bytes,
            },
            BackendError::Other(msg) => Self::Backend(msg),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}
