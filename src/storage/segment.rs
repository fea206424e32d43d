use chrono::{DateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::{DocumentRecord, PageRecord, Transcription};
use crate::index::entry::IndexEntry;

/// Unique segment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub Uuid);

impl SegmentId {
    pub fn new() -> Self {
        SegmentId(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(SegmentId)
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything persisted for one document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSegment {
    pub document: DocumentRecord,
    pub pages: Vec<PageRecord>,               // Sorted by page_id
    pub transcriptions: Vec<Transcription>,   // By page, then line position
    pub entries: Vec<IndexEntry>,             // Sorted by page_id
    pub lexicon: Vec<u8>,                     // FST term table
}

impl DocumentSegment {
    pub fn page(&self, page_id: &str) -> Option<&PageRecord> {
        self.pages
            .binary_search_by(|p| p.page_id.as_str().cmp(page_id))
            .ok()
            .map(|pos| &self.pages[pos])
    }

    pub fn lines(&self, page_id: &str) -> impl Iterator<Item = &Transcription> {
        self.transcriptions.iter().filter(move |t| t.page_id == page_id)
    }

    pub(crate) fn to_payload(&self) -> Result<Vec<u8>> {
        let payload = SegmentPayload {
            document: StoredDocument {
                id: self.document.id.clone(),
                filename: self.document.filename.clone(),
                metadata: self.document.metadata
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                ingested_at: self.document.ingested_at,
            },
            pages: self.pages.clone(),
            transcriptions: self.transcriptions.clone(),
            entries: self.entries.clone(),
            lexicon: self.lexicon.clone(),
        };
        Ok(bincode::serialize(&payload)?)
    }

    pub(crate) fn from_payload(bytes: &[u8]) -> Result<Self> {
        let payload: SegmentPayload = bincode::deserialize(bytes)?;
        let metadata = payload.document.metadata
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|e| Error::corrupt(format!("document metadata: {}", e)))?;

        Ok(DocumentSegment {
            document: DocumentRecord {
                id: payload.document.id,
                filename: payload.document.filename,
                metadata,
                ingested_at: payload.document.ingested_at,
            },
            pages: payload.pages,
            transcriptions: payload.transcriptions,
            entries: payload.entries,
            lexicon: payload.lexicon,
        })
    }
}

// Free-form metadata is kept as JSON text; bincode cannot decode
// self-describing values.
#[derive(Serialize, Deserialize)]
struct StoredDocument {
    id: String,
    filename: String,
    metadata: Option<String>,
    ingested_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct SegmentPayload {
    document: StoredDocument,
    pages: Vec<PageRecord>,
    transcriptions: Vec<Transcription>,
    entries: Vec<IndexEntry>,
    lexicon: Vec<u8>,
}

/// Segment file header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentHeader {
    pub magic: [u8; 4],
    pub version: u32,         // Format version
    pub compression: u8,      // CompressionType tag
    pub original_len: u64,    // Payload bytes before compression
    pub payload_len: u64,     // Payload bytes on disk
    pub checksum: u32,        // CRC32 of the on-disk payload
}

impl SegmentHeader {
    pub const MAGIC: [u8; 4] = *b"OCRX";
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 29; // Fixed header size, bincode fixint encoding

    pub fn validate(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(Error::corrupt("not a segment file"));
        }
        if self.version != Self::VERSION {
            return Err(Error::corrupt(format!("incompatible segment version {}", self.version)));
        }
        Ok(())
    }
}
