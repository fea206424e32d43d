use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use crate::core::error::Result;
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::SegmentId;
use crate::storage::wal::{Operation, SyncMode, WAL};

/// Which segment holds each document. The only mutable metadata file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub documents: BTreeMap<String, SegmentId>,
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Catalog {
    /// Load the catalog from disk; a fresh store has an empty one.
    pub fn load(storage: &StorageLayout) -> Result<Self> {
        let path = storage.catalog_path();
        if !path.exists() {
            return Ok(Catalog::default());
        }

        let data = fs::read(path)?;
        let catalog = bincode::deserialize(&data)?;
        Ok(catalog)
    }

    /// Replace the catalog file atomically (temp file + rename).
    pub fn save(&self, storage: &StorageLayout) -> Result<()> {
        let data = bincode::serialize(self)?;

        let mut tmp = NamedTempFile::new_in(&storage.meta_dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(storage.catalog_path())?;
        Ok(())
    }

    /// Copy with `document_id` pointing at `segment`.
    pub fn with_document(&self, document_id: &str, segment: SegmentId) -> Self {
        let mut next = self.clone();
        next.documents.insert(document_id.to_string(), segment);
        next.generation += 1;
        next.updated_at = Some(Utc::now());
        next
    }

    pub fn segment_of(&self, document_id: &str) -> Option<SegmentId> {
        self.documents.get(document_id).copied()
    }
}

/// Outcome of replaying the logs at open time
#[derive(Debug, Default)]
pub struct RecoveryReport {
    pub interrupted: Vec<String>,   // Documents whose last ingest never committed
    pub removed_segments: usize,
}

pub struct RecoveryManager<'a> {
    pub storage: &'a StorageLayout,
    pub catalog: &'a Catalog,
}

impl<'a> RecoveryManager<'a> {
    pub fn new(storage: &'a StorageLayout, catalog: &'a Catalog) -> Self {
        RecoveryManager { storage, catalog }
    }

    /// Replay the logs, delete segments the catalog does not reference, and
    /// open a fresh log after the last one.
    pub fn recover(&self, sync_mode: SyncMode) -> Result<(WAL, RecoveryReport)> {
        let sequences = WAL::find_wal_files(self.storage)?;
        let next_sequence = sequences.last().map(|s| s + 1).unwrap_or(0);
        let mut report = RecoveryReport::default();

        // Another process mid-ingest owns its in-flight files; leave them alone
        let Ok(_lock) = FileLock::acquire(self.storage) else {
            warn!(path = %self.storage.base_dir.display(), "store is locked by another writer, skipping recovery");
            let wal = WAL::open(self.storage, next_sequence, sync_mode)?;
            return Ok((wal, report));
        };

        let mut pending: BTreeMap<SegmentId, String> = BTreeMap::new();
        for sequence in &sequences {
            for entry in WAL::read_entries(&self.storage.wal_path(*sequence))? {
                match entry.operation {
                    Operation::BeginIngest { document_id, segment } => {
                        pending.insert(segment, document_id);
                    }
                    Operation::CommitIngest { segment, .. } | Operation::AbortIngest { segment, .. } => {
                        pending.remove(&segment);
                    }
                }
            }
        }
        report.interrupted = pending.into_values().collect();

        let live: HashSet<SegmentId> = self.catalog.documents.values().copied().collect();
        for segment in self.storage.segment_files()? {
            if live.contains(&segment) {
                continue;
            }
            let path = self.storage.segment_path(&segment);
            match fs::remove_file(&path) {
                Ok(()) => report.removed_segments += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove orphaned segment"),
            }
        }

        let wal = WAL::open(self.storage, next_sequence, sync_mode)?;
        for sequence in sequences {
            let path = self.storage.wal_path(sequence);
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "could not remove replayed WAL file");
            }
        }

        if !report.interrupted.is_empty() || report.removed_segments > 0 {
            info!(
                interrupted = ?report.interrupted,
                removed_segments = report.removed_segments,
                "recovered store"
            );
        }

        Ok((wal, report))
    }
}
