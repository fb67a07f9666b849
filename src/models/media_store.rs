//! The gallery's authoritative record list and its persisted mirror.
//!
//! This module provides the `MediaStore` struct which handles:
//! - Loading the record list from a persistence slot at startup
//! - Seeding records from probed candidate paths
//! - Ingesting uploads as embedded payloads
//! - Filtering, export, and additive import
//!
//! Every mutation that should survive a reload is followed by `persist()`.
//! A failed persist never rolls back the in-memory list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{
    format_file_size, new_record_id, MediaFilter, MediaKind, MediaRecord, Result, StoreError,
};
use crate::scanner::{Candidate, ExistenceProbe};
use crate::storage::PersistenceBackend;
use crate::upload::FileDescriptor;

/// Name of the persistence slot holding the serialized record list.
pub const DEFAULT_STORAGE_KEY: &str = "personalGalleryMedia";

/// What `initialize` found in the persistence slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No slot stored yet.
    Empty,
    /// Slot parsed; holds this many records.
    Loaded(usize),
    /// Slot unreadable or corrupt; started with an empty list.
    Recovered,
}

/// Result of a seeding pass.
#[derive(Debug, Default)]
pub struct SeedReport {
    /// Number of candidates probed.
    pub probed: usize,
    /// Number of candidates that exist.
    pub found: usize,
    /// Number of seeded records appended.
    pub added: usize,
    /// Set when the reconciled list could not be persisted.
    pub persist_error: Option<StoreError>,
}

/// Per-file outcome of a batch upload.
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Ids of records that were added.
    pub added: Vec<String>,
    /// Files that were rejected, with the reason.
    pub failed: Vec<(String, StoreError)>,
    /// Set when the batch was ingested but could not be persisted.
    pub persist_error: Option<StoreError>,
}

/// Serializable export of the full record list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "exportDate")]
    pub exported_at: DateTime<Utc>,
    pub items: Vec<MediaRecord>,
}

/// Download name for an export taken on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("gallery-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Ordered list of gallery records backed by a persistence slot.
pub struct MediaStore {
    records: Vec<MediaRecord>,
    backend: Box<dyn PersistenceBackend>,
    probe: Box<dyn ExistenceProbe>,
    key: String,
}

impl MediaStore {
    /// Creates an empty store using the default slot name.
    ///
    /// Call `initialize` to load previously persisted records.
    #[cfg(test)]
    pub fn new(backend: Box<dyn PersistenceBackend>, probe: Box<dyn ExistenceProbe>) -> Self {
        Self::with_key(backend, probe, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(
        backend: Box<dyn PersistenceBackend>,
        probe: Box<dyn ExistenceProbe>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            records: Vec::new(),
            backend,
            probe,
            key: key.into(),
        }
    }

    /// Loads persisted records. Never fails: a missing, unreadable, or corrupt
    /// slot leaves the store empty and is logged.
    pub fn initialize(&mut self) -> LoadOutcome {
        let stored = match self.backend.get(&self.key) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!(key = %self.key, "No stored media");
                self.records.clear();
                return LoadOutcome::Empty;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to load stored media");
                self.records.clear();
                return LoadOutcome::Recovered;
            }
        };

        match serde_json::from_str::<Vec<MediaRecord>>(&stored) {
            Ok(records) => {
                info!(count = records.len(), "Loaded stored media");
                self.records = records;
                LoadOutcome::Loaded(self.records.len())
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to load stored media, starting empty");
                self.records.clear();
                LoadOutcome::Recovered
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Reconciles seeded records against `candidates`.
    ///
    /// Drops every seeded record, then probes each candidate in order, one at a
    /// time, appending a seeded record for each hit unless one with the same
    /// source path or name is already present. Uploaded records are untouched.
    /// A failed persist keeps the reconciled list and lands in the report.
    pub async fn seed_from_candidates(&mut self, candidates: &[Candidate]) -> SeedReport {
        let before = self.records.len();
        self.records.retain(|r| !r.is_seeded());
        debug!(
            dropped = before - self.records.len(),
            "Cleared previous seeded records"
        );

        let mut report = SeedReport::default();
        for candidate in candidates {
            report.probed += 1;
            if !self.probe.check(&candidate.path).await {
                continue;
            }
            report.found += 1;

            let exists = self.records.iter().any(|r| {
                r.source_path() == Some(candidate.path.as_str())
                    || (r.is_seeded() && r.name == candidate.name)
            });
            if exists {
                debug!(path = %candidate.path, "Seeded candidate already present");
                continue;
            }

            self.records.push(MediaRecord::seeded(
                candidate.name.clone(),
                candidate.kind,
                candidate.path.clone(),
            ));
            report.added += 1;
            debug!(name = %candidate.name, "Added seeded file");
        }

        if report.added > 0 {
            info!(added = report.added, "Found files in asset folders");
        } else {
            info!("No files found in asset folders; add media under assets/images or assets/video");
        }

        if let Err(e) = self.persist() {
            report.persist_error = Some(e);
        }
        report
    }

    /// Validates and ingests one upload, then persists.
    ///
    /// On a persist failure the new record stays in the list and the
    /// `QuotaExceeded` (or backend) error is returned.
    pub async fn add_uploaded(&mut self, file: &dyn FileDescriptor) -> Result<String> {
        let id = self.ingest(file).await?;
        self.persist()?;
        Ok(id)
    }

    /// Ingests each file independently and persists once at the end.
    ///
    /// A rejected file does not stop the rest of the batch.
    pub async fn add_uploaded_batch(&mut self, files: &[&dyn FileDescriptor]) -> UploadReport {
        let mut report = UploadReport::default();

        for file in files {
            match self.ingest(*file).await {
                Ok(id) => report.added.push(id),
                Err(e) => {
                    warn!(name = %file.name(), error = %e, "Upload rejected");
                    report.failed.push((file.name().to_string(), e));
                }
            }
        }

        if let Err(e) = self.persist() {
            report.persist_error = Some(e);
        }
        report
    }

    async fn ingest(&mut self, file: &dyn FileDescriptor) -> Result<String> {
        let declared = file.declared_type();
        let kind = MediaKind::from_declared_type(declared).ok_or_else(|| {
            StoreError::UnsupportedType {
                name: file.name().to_string(),
                declared_type: declared.to_string(),
            }
        })?;

        let payload = file
            .read_as_embedded_payload()
            .await
            .map_err(|source| StoreError::Read {
                name: file.name().to_string(),
                source,
            })?;

        let mut record = MediaRecord::uploaded(file.name(), kind, payload, file.size());
        while self.records.iter().any(|r| r.id == record.id) {
            record.id = new_record_id("upload");
        }

        let id = record.id.clone();
        debug!(%id, name = %record.name, kind = kind.as_str(), "Ingested upload");
        self.records.push(record);
        Ok(id)
    }

    /// Removes every record with `id`, then persists.
    ///
    /// Returns whether anything was removed. An unknown id is not an error.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = self.records.len() != before;
        if removed {
            debug!(id, "Removed record");
        }
        self.persist()?;
        Ok(removed)
    }

    /// Appends all items from an exported snapshot, then persists.
    ///
    /// Fails with `InvalidFormat` when `items` is missing, is not an array, or
    /// holds an entry that is not a record; nothing is merged in that case.
    /// Items are appended as-is, without deduplication.
    pub fn import_snapshot(&mut self, data: &serde_json::Value) -> Result<usize> {
        let items = data
            .get("items")
            .and_then(|v| v.as_array())
            .ok_or_else(|| StoreError::InvalidFormat("expected an `items` array".to_string()))?;

        let parsed = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value::<MediaRecord>(item.clone())
                    .map_err(|e| StoreError::InvalidFormat(format!("item {i}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let count = parsed.len();
        self.records.extend(parsed);
        info!(count, "Imported records");

        self.persist()?;
        Ok(count)
    }

    /// Reads a backup file and imports it.
    pub async fn import_file(&mut self, path: &Path) -> Result<usize> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Read {
                name: path.display().to_string(),
                source,
            })?;
        let data: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| StoreError::InvalidFormat(format!("not JSON: {e}")))?;
        self.import_snapshot(&data)
    }

    /// Drops the persisted slot, then empties the list.
    ///
    /// When the slot cannot be removed the list is left as it was.
    pub fn clear_all(&mut self) -> Result<()> {
        self.backend
            .remove(&self.key)
            .map_err(|e| StoreError::from_backend(&self.key, e))?;
        self.records.clear();
        info!("Cleared all media");
        Ok(())
    }

    /// Serializes the full record list into the slot, replacing its contents.
    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.records)?;
        match self.backend.set(&self.key, &json) {
            Ok(()) => {
                debug!(count = self.records.len(), bytes = json.len(), "Persisted media");
                Ok(())
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to persist media");
                Err(StoreError::from_backend(&self.key, e))
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Records matching `filter`, in insertion order.
    pub fn list(&self, filter: MediaFilter) -> Vec<MediaRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&MediaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            exported_at: Utc::now(),
            items: self.records.clone(),
        }
    }

    /// Writes a pretty-printed snapshot into `dir` and returns its path.
    pub fn write_export(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let snapshot = self.export_snapshot();
        let path = dir.join(export_file_name(snapshot.exported_at.date_naive()));
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write export to {:?}", path))?;
        info!(?path, items = snapshot.items.len(), "Exported gallery");
        Ok(path)
    }

    /// Total declared size of all records, human-readable.
    ///
    /// Sizes come from imports unchecked, so the sum saturates.
    pub fn storage_usage(&self) -> String {
        let total = self
            .records
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.size_bytes));
        format_file_size(total)
    }

    /// Ids that occur more than once (only possible after an import).
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for r in &self.records {
            if !seen.insert(r.id.as_str()) && !dups.contains(&r.id) {
                dups.push(r.id.clone());
            }
        }
        dups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;
    use crate::storage::{BackendError, MemoryBackend, SqliteBackend};
    use crate::upload::MemoryFile;
    use async_trait::async_trait;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    /// Probe that reports a fixed set of paths as present.
    struct SetProbe {
        present: HashSet<String>,
        calls: Rc<Cell<usize>>,
    }

    impl SetProbe {
        fn new(paths: &[&str]) -> Self {
            Self {
                present: paths.iter().map(|p| p.to_string()).collect(),
                calls: Rc::new(Cell::new(0)),
            }
        }
    }

    #[async_trait(?Send)]
    impl ExistenceProbe for SetProbe {
        async fn check(&self, path: &str) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.present.contains(path)
        }
    }

    /// Probe whose fetch never completes.
    struct HangingProbe;

    #[async_trait(?Send)]
    impl ExistenceProbe for HangingProbe {
        async fn check(&self, _path: &str) -> bool {
            std::future::pending::<bool>().await
        }
    }

    /// Backend that keeps writes but refuses to drop its slot.
    #[derive(Clone, Default)]
    struct StickyBackend {
        inner: MemoryBackend,
    }

    impl PersistenceBackend for StickyBackend {
        fn get(&self, key: &str) -> std::result::Result<Option<String>, BackendError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> std::result::Result<(), BackendError> {
            self.inner.set(key, value)
        }

        fn remove(&self, _key: &str) -> std::result::Result<(), BackendError> {
            Err(BackendError::Other("slot is locked".to_string()))
        }
    }

    fn memory_store(backend: &MemoryBackend, present: &[&str]) -> MediaStore {
        MediaStore::new(Box::new(backend.clone()), Box::new(SetProbe::new(present)))
    }

    fn seeded_paths(store: &MediaStore) -> Vec<String> {
        store
            .list(MediaFilter::All)
            .iter()
            .filter_map(|r| r.source_path().map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_upload_and_filter() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);

        store
            .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", b"meow"))
            .await
            .unwrap();
        store
            .add_uploaded(&MemoryFile::new("dog.mp4", "video/mp4", b"woof"))
            .await
            .unwrap();

        let all: Vec<_> = store.list(MediaFilter::All).into_iter().map(|r| r.name).collect();
        assert_eq!(all, vec!["cat.jpg", "dog.mp4"]);

        let images = store.list(MediaFilter::Images);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "cat.jpg");
        assert_eq!(images[0].size_bytes, 4);
        assert_eq!(images[0].origin(), Origin::Uploaded);
        assert_eq!(images[0].payload(), Some("data:image/jpeg;base64,bWVvdw=="));

        let videos = store.list(MediaFilter::Videos);
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].name, "dog.mp4");
    }

    #[tokio::test]
    async fn test_filters_partition_all() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);

        let files = [
            MemoryFile::new("a.mp4", "video/mp4", b"1"),
            MemoryFile::new("b.png", "image/png", b"2"),
            MemoryFile::new("c.png", "image/png", b"3"),
            MemoryFile::new("d.webm", "video/webm", b"4"),
            MemoryFile::new("e.gif", "image/gif", b"5"),
        ];
        for f in &files {
            store.add_uploaded(f).await.unwrap();
        }

        let all = store.list(MediaFilter::All);
        let images = store.list(MediaFilter::Images);
        let videos = store.list(MediaFilter::Videos);
        assert_eq!(all.len(), images.len() + videos.len());

        // Each filtered view is a subsequence of the full list
        for view in [&images, &videos] {
            let positions: Vec<_> = view
                .iter()
                .map(|r| all.iter().position(|a| a.id == r.id).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);
        store
            .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", b"x"))
            .await
            .unwrap();

        let err = store
            .add_uploaded(&MemoryFile::new("notes.txt", "text/plain", b"hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::UnsupportedType { ref declared_type, .. } if declared_type == "text/plain"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_read_error_rejected() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);

        let err = store
            .add_uploaded(&MemoryFile::unreadable("broken.png", "image/png"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Read { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_quota_exceeded_keeps_record() {
        // "[]" fits, a single record does not
        let backend = MemoryBackend::with_quota(16);
        let mut store = memory_store(&backend, &[]);
        store.initialize();

        let err = store
            .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", &[0u8; 256]))
            .await
            .unwrap_err();

        assert!(err.is_quota_exceeded());
        let all = store.list(MediaFilter::All);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "cat.jpg");
        assert_eq!(backend.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_batch_upload_continues_past_failures() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);

        let good_image = MemoryFile::new("cat.jpg", "image/jpeg", b"1");
        let text = MemoryFile::new("notes.txt", "text/plain", b"2");
        let unreadable = MemoryFile::unreadable("bad.mp4", "video/mp4");
        let good_video = MemoryFile::new("dog.mp4", "video/mp4", b"3");
        let files: Vec<&dyn FileDescriptor> = vec![&good_image, &text, &unreadable, &good_video];

        let report = store.add_uploaded_batch(&files).await;

        assert_eq!(report.added.len(), 2);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, "notes.txt");
        assert!(matches!(report.failed[0].1, StoreError::UnsupportedType { .. }));
        assert!(matches!(report.failed[1].1, StoreError::Read { .. }));
        assert!(report.persist_error.is_none());

        let names: Vec<_> = store.list(MediaFilter::All).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["cat.jpg", "dog.mp4"]);
    }

    #[tokio::test]
    async fn test_ids_stay_unique() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);

        for round in 0..20 {
            let file = MemoryFile::new(&format!("img{round}.png"), "image/png", b"same");
            let id = store.add_uploaded(&file).await.unwrap();
            if round % 3 == 0 {
                store.remove(&id).unwrap();
            }

            let ids: HashSet<_> = store.list(MediaFilter::All).into_iter().map(|r| r.id).collect();
            assert_eq!(ids.len(), store.len());
        }
        assert!(store.duplicate_ids().is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);
        let id = store
            .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", b"1"))
            .await
            .unwrap();

        assert!(!store.remove("missing").unwrap());
        assert_eq!(store.len(), 1);

        assert!(store.remove(&id).unwrap());
        assert!(store.is_empty());
        assert_eq!(backend.get(DEFAULT_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_persist_mirrors_memory() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);
        store
            .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", b"1"))
            .await
            .unwrap();

        let stored = backend.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let parsed: Vec<MediaRecord> = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, store.list(MediaFilter::All));
    }

    #[tokio::test]
    async fn test_seed_from_candidates() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(
            &backend,
            &["assets/video/video1.mp4", "assets/images/photo3.jpg"],
        );
        store
            .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", b"1"))
            .await
            .unwrap();

        let candidates = crate::scanner::guess_candidates();
        let report = store.seed_from_candidates(&candidates).await;

        assert_eq!(report.probed, candidates.len());
        assert_eq!(report.found, 2);
        assert_eq!(report.added, 2);
        assert!(report.persist_error.is_none());
        assert_eq!(
            seeded_paths(&store),
            vec!["assets/video/video1.mp4", "assets/images/photo3.jpg"]
        );

        let seeded = store.list(MediaFilter::Videos);
        assert_eq!(seeded[0].size_bytes, 0);
        assert!(seeded[0].is_seeded());
        // Uploaded record kept in front
        assert_eq!(store.list(MediaFilter::All)[0].name, "cat.jpg");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let backend = MemoryBackend::default();
        let present = ["assets/video/sample2.mp4", "assets/images/image1.jpg"];
        let mut store = memory_store(&backend, &present);
        store
            .add_uploaded(&MemoryFile::new("dog.mp4", "video/mp4", b"1"))
            .await
            .unwrap();

        let candidates = crate::scanner::guess_candidates();
        store.seed_from_candidates(&candidates).await;
        let first = seeded_paths(&store);

        store.seed_from_candidates(&candidates).await;
        let second = seeded_paths(&store);

        assert_eq!(first, second);
        assert_eq!(store.len(), 3);
        assert_eq!(store.list(MediaFilter::All)[0].name, "dog.mp4");
    }

    #[tokio::test]
    async fn test_seed_skips_duplicate_names() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &["a/x.jpg", "b/x.jpg"]);

        let candidates = vec![
            Candidate::new("a/x.jpg", "x.jpg", MediaKind::Image),
            Candidate::new("b/x.jpg", "x.jpg", MediaKind::Image),
            Candidate::new("a/x.jpg", "other.jpg", MediaKind::Image),
        ];
        let report = store.seed_from_candidates(&candidates).await;

        assert_eq!(report.found, 3);
        assert_eq!(report.added, 1);
        assert_eq!(seeded_paths(&store), vec!["a/x.jpg"]);
    }

    #[tokio::test]
    async fn test_seed_persist_failure_keeps_report() {
        let backend = MemoryBackend::with_quota(16);
        let mut store = memory_store(&backend, &["assets/images/image1.jpg", "assets/video/video1.mp4"]);

        let report = store
            .seed_from_candidates(&crate::scanner::guess_candidates())
            .await;

        assert_eq!(report.found, 2);
        assert_eq!(report.added, 2);
        assert!(report.persist_error.as_ref().is_some_and(StoreError::is_quota_exceeded));
        assert_eq!(store.len(), 2);
        assert_eq!(backend.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_seed_probes_in_order_one_at_a_time() {
        let backend = MemoryBackend::default();
        let probe = SetProbe::new(&[]);
        let calls = Rc::clone(&probe.calls);
        let mut store = MediaStore::new(Box::new(backend), Box::new(probe));

        let candidates = crate::scanner::guess_candidates();
        let report = store.seed_from_candidates(&candidates).await;

        assert_eq!(calls.get(), candidates.len());
        assert_eq!(report.added, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_hanging_probe_blocks_seeding() {
        // Known boundary: the store applies no timeout, so a probe that never
        // answers stalls the whole seeding pass.
        let mut store = MediaStore::new(Box::new(MemoryBackend::default()), Box::new(HangingProbe));
        let candidates = vec![Candidate::new("a.jpg", "a.jpg", MediaKind::Image)];

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), store.seed_from_candidates(&candidates))
                .await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let backend = MemoryBackend::default();
        let mut source = memory_store(&backend, &["assets/images/image1.jpg"]);
        source
            .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", b"1"))
            .await
            .unwrap();
        source
            .seed_from_candidates(&crate::scanner::guess_candidates())
            .await;

        let snapshot = source.export_snapshot();
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("exportDate").is_some());

        let mut target = memory_store(&MemoryBackend::default(), &[]);
        let count = target.import_snapshot(&value).unwrap();

        assert_eq!(count, 2);
        assert_eq!(target.list(MediaFilter::All), source.list(MediaFilter::All));
    }

    #[tokio::test]
    async fn test_import_is_additive() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);
        store
            .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", b"1"))
            .await
            .unwrap();

        let value = serde_json::to_value(store.export_snapshot()).unwrap();
        store.import_snapshot(&value).unwrap();

        // Same ids imported twice are tolerated
        assert_eq!(store.len(), 2);
        assert_eq!(store.duplicate_ids().len(), 1);

        // Removing a duplicated id drops every copy
        let id = store.duplicate_ids().remove(0);
        assert!(store.remove(&id).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_import_rejects_invalid_format() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);
        let existing = MediaRecord::seeded("a.jpg", MediaKind::Image, "assets/images/a.jpg");
        store
            .import_snapshot(&serde_json::json!({ "items": [existing] }))
            .unwrap();

        for bad in [
            serde_json::json!({}),
            serde_json::json!({ "items": 5 }),
            serde_json::json!({ "items": { "a": 1 } }),
            serde_json::json!({ "items": [existing, { "name": "half a record" }] }),
        ] {
            let err = store.import_snapshot(&bad).unwrap_err();
            assert!(matches!(err, StoreError::InvalidFormat(_)));
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_import_file() {
        let dir = tempdir().unwrap();
        let backend = MemoryBackend::default();
        let mut source = memory_store(&backend, &[]);
        source
            .add_uploaded(&MemoryFile::new("dog.mp4", "video/mp4", b"1"))
            .await
            .unwrap();
        let path = source.write_export(dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("gallery-backup-"));
        assert!(name.ends_with(".json"));

        let mut target = memory_store(&MemoryBackend::default(), &[]);
        assert_eq!(target.import_file(&path).await.unwrap(), 1);

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{not json").unwrap();
        assert!(matches!(
            target.import_file(&garbage).await.unwrap_err(),
            StoreError::InvalidFormat(_)
        ));
        assert!(matches!(
            target.import_file(&dir.path().join("missing.json")).await.unwrap_err(),
            StoreError::Read { .. }
        ));
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "gallery-backup-2024-03-07.json");
    }

    #[tokio::test]
    async fn test_reload_from_sqlite() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("gallery.sqlite");

        {
            let backend = SqliteBackend::open(&db_path, None).unwrap();
            let mut store = MediaStore::new(Box::new(backend), Box::new(SetProbe::new(&[])));
            assert_eq!(store.initialize(), LoadOutcome::Empty);
            store
                .add_uploaded(&MemoryFile::new("cat.jpg", "image/jpeg", b"1"))
                .await
                .unwrap();
        }

        let backend = SqliteBackend::open(&db_path, None).unwrap();
        let mut store = MediaStore::new(Box::new(backend), Box::new(SetProbe::new(&[])));
        assert_eq!(store.initialize(), LoadOutcome::Loaded(1));
        assert_eq!(store.list(MediaFilter::Images)[0].name, "cat.jpg");
    }

    #[test]
    #[traced_test]
    fn test_corrupt_slot_degrades_to_empty() {
        let backend = MemoryBackend::default();
        backend.insert_raw(DEFAULT_STORAGE_KEY, "{ definitely not a list");
        let mut store = memory_store(&backend, &[]);

        assert_eq!(store.initialize(), LoadOutcome::Recovered);
        assert!(store.is_empty());
        assert!(logs_contain("Failed to load stored media"));
    }

    #[tokio::test]
    async fn test_clear_all_and_usage() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);
        store
            .add_uploaded(&MemoryFile::new("a.png", "image/png", &[0u8; 1024]))
            .await
            .unwrap();
        store
            .add_uploaded(&MemoryFile::new("b.png", "image/png", &[0u8; 512]))
            .await
            .unwrap();
        assert_eq!(store.storage_usage(), "1.5 KB");

        store.clear_all().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.storage_usage(), "0 Bytes");
        assert_eq!(backend.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_list_when_slot_removal_fails() {
        let backend = StickyBackend::default();
        let mut store = MediaStore::new(Box::new(backend.clone()), Box::new(SetProbe::new(&[])));
        store
            .add_uploaded(&MemoryFile::new("a.png", "image/png", b"1"))
            .await
            .unwrap();

        let err = store.clear_all().unwrap_err();

        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.len(), 1);
        let stored = backend.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let parsed: Vec<MediaRecord> = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, store.list(MediaFilter::All));
    }

    #[test]
    fn test_usage_saturates_on_huge_imported_sizes() {
        let backend = MemoryBackend::default();
        let mut store = memory_store(&backend, &[]);
        let mut big = MediaRecord::seeded("big.mp4", MediaKind::Video, "assets/video/big.mp4");
        big.size_bytes = u64::MAX;
        let mut other = big.clone();
        other.id = new_record_id("folder");

        store
            .import_snapshot(&serde_json::json!({ "items": [big, other] }))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.storage_usage(), format_file_size(u64::MAX));
    }
}
