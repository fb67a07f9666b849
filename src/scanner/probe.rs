//! Existence probes for seeded candidates.
//!
//! A probe never errors: anything other than a confirmed hit is reported as
//! "absent". There is no timeout here; a probe that never completes stalls
//! the seeding pass that awaits it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};

#[async_trait(?Send)]
pub trait ExistenceProbe {
    /// Returns true when `path` is present and readable as a file.
    async fn check(&self, path: &str) -> bool;
}

/// Probes paths relative to a local asset root.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait(?Send)]
impl ExistenceProbe for FsProbe {
    async fn check(&self, path: &str) -> bool {
        let full = self.root.join(path);
        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => {
                trace!(?full, "Probe hit");
                true
            }
            Ok(_) => {
                debug!(?full, "Probe target is not a file");
                false
            }
            Err(e) => {
                debug!(?full, error = %e, "File not found");
                false
            }
        }
    }
}
