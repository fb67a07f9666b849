//! In-memory persistence backend.
//!
//! Nothing survives the process. Used by `--ephemeral` runs and by tests that
//! need to simulate a full browser storage quota.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::{check_quota, BackendError, PersistenceBackend};

#[derive(Clone, Default)]
pub struct MemoryBackend {
    slots: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    /// Backend that rejects any single value larger than `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            slots: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Writes a raw value, bypassing the quota. Lets tests plant corrupt data.
    #[cfg(test)]
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.slots.lock().insert(key.to_string(), value.to_string());
    }
}

impl PersistenceBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        check_quota(value, self.quota_bytes)?;
        self.slots.lock().insert(key.to_string(), value.to_string());
        trace!(key, bytes = value.len(), "Stored slot in memory");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.slots.lock().remove(key);
        Ok(())
    }
}
