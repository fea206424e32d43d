use std::fs::{self, File, OpenOptions};
use std::io::{Write, Read};
use std::path::Path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::SegmentId;
use crate::core::error::{Result, Error};

/// Write-ahead log of ingestion transactions
pub struct WAL {
    pub file: File,
    pub position: u64,
    pub sync_mode: SyncMode,
    pub file_sequence: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    Immediate,  // fsync after every write
    None,       // Let OS handle it
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WALEntry {
    pub sequence: u64,
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// A new segment is about to be written for `document_id`.
    BeginIngest { document_id: String, segment: SegmentId },
    /// The catalog now points at `segment`; `replaced` may be deleted.
    CommitIngest { document_id: String, segment: SegmentId, replaced: Option<SegmentId> },
    /// The transaction failed; `segment` is garbage.
    AbortIngest { document_id: String, segment: SegmentId },
}

const MAX_ENTRY_BYTES: usize = 1024 * 1024;

impl WAL {
    pub fn open(storage: &StorageLayout, file_sequence: u64, sync_mode: SyncMode) -> Result<Self> {
        let path = storage.wal_path(file_sequence);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let position = file.metadata()?.len();

        Ok(WAL {
            file,
            position,
            sync_mode,
            file_sequence,
            sequence: 0,
        })
    }

    pub fn append(&mut self, operation: Operation) -> Result<()> {
        let entry = WALEntry {
            sequence: self.sequence,
            operation,
            timestamp: Utc::now(),
        };

        let data = bincode::serialize(&entry)?;
        let len = data.len() as u32;

        // Write length + data
        self.file.write_all(&len.to_le_bytes())?;
        self.file.write_all(&data)?;

        self.sequence += 1;
        self.position += 4 + data.len() as u64;

        if self.sync_mode == SyncMode::Immediate {
            self.file.sync_all()?;
        }

        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Start a new log file and drop the current one. Only call between
    /// transactions.
    pub fn rotate(&mut self, storage: &StorageLayout) -> Result<()> {
        self.sync()?;

        let old_path = storage.wal_path(self.file_sequence);
        let new_wal = WAL::open(storage, self.file_sequence + 1, self.sync_mode)?;
        *self = new_wal;

        if let Err(e) = fs::remove_file(&old_path) {
            warn!(path = %old_path.display(), error = %e, "could not remove rotated WAL file");
        }
        Ok(())
    }

    /// Read all entries of one log file. A torn tail from a crash ends the
    /// log; it is not an error.
    pub fn read_entries(path: &Path) -> Result<Vec<WALEntry>> {
        let mut entries = Vec::new();
        let mut file = File::open(path)?;

        loop {
            // Try to read length
            let mut len_buf = [0u8; 4];
            match file.read_exact(&mut len_buf) {
                Ok(_) => {},
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_ENTRY_BYTES {
                return Err(Error::corrupt(format!("WAL entry of {} bytes in {}", len, path.display())));
            }

            let mut data = vec![0u8; len];
            if file.read_exact(&mut data).is_err() {
                warn!(path = %path.display(), "truncated WAL entry, ignoring tail");
                break;
            }

            match bincode::deserialize::<WALEntry>(&data) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "undecodable WAL entry, ignoring tail");
                    break;
                }
            }
        }

        Ok(entries)
    }

    /// Sequence numbers of all WAL files, ascending.
    pub fn find_wal_files(storage: &StorageLayout) -> Result<Vec<u64>> {
        let mut sequences = Vec::new();

        for entry in fs::read_dir(storage.wal_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("log") {
                continue;
            }
            // Format: wal_00000000.log
            let sequence = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix("wal_"))
                .and_then(|s| s.parse::<u64>().ok());
            if let Some(sequence) = sequence {
                sequences.push(sequence);
            }
        }

        sequences.sort();
        Ok(sequences)
    }
}
