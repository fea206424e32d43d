use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;
use crate::compression::compress::CompressionType;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::index::inverted::InvertedIndex;
use crate::search::autocomplete::{term_frequencies, Lexicon};
use crate::storage::catalog::Catalog;
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{DocumentSegment, SegmentId};
use crate::storage::segment_writer::SegmentWriter;
use crate::storage::wal::{Operation, WAL};
use crate::writer::document::PreparedDocument;

/// In-memory view of the store, guarded by the database's RwLock
#[derive(Default)]
pub struct IndexState {
    pub catalog: Catalog,
    pub documents: BTreeMap<String, Arc<DocumentSegment>>,
    pub index: InvertedIndex,
}

impl IndexState {
    /// Add a loaded segment's entries to the index.
    pub fn insert_segment(&mut self, analyzer: &Analyzer, segment: Arc<DocumentSegment>) {
        let document_id = segment.document.id.clone();
        self.index.remove_document(&document_id);
        for entry in &segment.entries {
            self.index.add_entry(&document_id, &entry.page_id, &analyzer.analyze(&entry.text));
        }
        self.documents.insert(document_id, segment);
    }
}

/// Entry tokens computed ahead of the commit
pub struct AnalyzedDocument {
    pub prepared: PreparedDocument,
    pub tokens: Vec<(String, Vec<Token>)>,
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub compression: CompressionType,
    pub autocomplete_min_count: u64,
    pub wal_rotate_bytes: u64,
}

impl From<&Config> for WriterConfig {
    fn from(config: &Config) -> Self {
        WriterConfig {
            compression: config.segment_compression,
            autocomplete_min_count: config.autocomplete_min_count,
            wal_rotate_bytes: config.wal_rotate_bytes,
        }
    }
}

/// Single writer: runs the ingestion transaction
pub struct IndexWriter {
    pub storage: Arc<StorageLayout>,
    pub wal: WAL,
    pub analyzer: Arc<Analyzer>,
    pub config: WriterConfig,
}

impl IndexWriter {
    pub fn new(storage: Arc<StorageLayout>, wal: WAL, analyzer: Arc<Analyzer>, config: WriterConfig) -> Self {
        IndexWriter {
            storage,
            wal,
            analyzer,
            config,
        }
    }

    /// Tokenize entry texts. Needs no lock on the index.
    pub fn analyze(&self, prepared: PreparedDocument) -> AnalyzedDocument {
        let tokens = prepared.entries
            .iter()
            .map(|entry| (entry.page_id.clone(), self.analyzer.analyze(&entry.text)))
            .collect();
        AnalyzedDocument { prepared, tokens }
    }

    /// Replace the document's index entries, derive its term table, write a
    /// new segment and swap the catalog. On failure the index is restored to
    /// the previous version of the document and the old segment stays live.
    pub fn commit(&mut self, state: &mut IndexState, analyzed: AnalyzedDocument) -> Result<Arc<DocumentSegment>> {
        let AnalyzedDocument { prepared, tokens } = analyzed;
        let document_id = prepared.document.id.clone();

        let _lock = FileLock::acquire(&self.storage)
            .map_err(|e| e.into_ingest(&document_id))?;

        let previous = state.documents.get(&document_id).cloned();
        let replaced = state.catalog.segment_of(&document_id);

        let removed = state.index.remove_document(&document_id);
        debug!(document_id = %document_id, removed, "removed previous index entries");

        let terms: BTreeSet<&str> = tokens
            .iter()
            .flat_map(|(_, tokens)| tokens.iter().map(|t| t.text.as_str()))
            .collect();

        let before = state.index.vocabulary_counts(terms.iter().copied());
        for (page_id, page_tokens) in &tokens {
            state.index.add_entry(&document_id, page_id, page_tokens);
        }
        let after = state.index.vocabulary_counts(terms.iter().copied());

        let frequencies = term_frequencies(&before, &after, self.config.autocomplete_min_count);

        let segment_id = SegmentId::new();
        let persisted = Lexicon::build(&frequencies).and_then(|lexicon| {
            let segment = DocumentSegment {
                document: prepared.document,
                pages: prepared.pages,
                transcriptions: prepared.transcriptions,
                entries: prepared.entries,
                lexicon,
            };
            let catalog = self.persist(&state.catalog, &document_id, segment_id, &segment, replaced)?;
            Ok((catalog, segment))
        });

        match persisted {
            Ok((catalog, segment)) => {
                let segment = Arc::new(segment);
                state.catalog = catalog;
                state.documents.insert(document_id.clone(), segment.clone());
                info!(
                    document_id = %document_id,
                    segment = %segment_id,
                    pages = segment.pages.len(),
                    lines = segment.transcriptions.len(),
                    terms = frequencies.len(),
                    "ingested document"
                );
                Ok(segment)
            }
            Err(e) => {
                state.index.remove_document(&document_id);
                if let Some(previous) = previous {
                    state.insert_segment(&self.analyzer, previous);
                }
                warn!(document_id = %document_id, error = %e, "ingest rolled back");
                Err(e.into_ingest(&document_id))
            }
        }
    }

    /// WAL begin, segment, catalog, WAL commit, then drop the old segment.
    fn persist(
        &mut self,
        catalog: &Catalog,
        document_id: &str,
        segment_id: SegmentId,
        segment: &DocumentSegment,
        replaced: Option<SegmentId>,
    ) -> Result<Catalog> {
        self.wal.append(Operation::BeginIngest {
            document_id: document_id.to_string(),
            segment: segment_id,
        })?;

        let written = self.write_segment_and_catalog(catalog, document_id, segment_id, segment);
        let next = match written {
            Ok(next) => next,
            Err(e) => {
                self.discard_segment(segment_id);
                if let Err(log_err) = self.wal.append(Operation::AbortIngest {
                    document_id: document_id.to_string(),
                    segment: segment_id,
                }) {
                    warn!(document_id, error = %log_err, "could not log aborted ingest");
                }
                return Err(e);
            }
        };

        // The catalog is already swapped; from here on the ingest stands
        if let Err(e) = self.wal.append(Operation::CommitIngest {
            document_id: document_id.to_string(),
            segment: segment_id,
            replaced,
        }) {
            warn!(document_id, error = %e, "could not log committed ingest");
        }

        if let Some(old) = replaced {
            self.discard_segment(old);
        }

        if self.wal.position >= self.config.wal_rotate_bytes {
            if let Err(e) = self.wal.rotate(&self.storage) {
                warn!(error = %e, "WAL rotation failed");
            }
        }

        Ok(next)
    }

    fn write_segment_and_catalog(
        &self,
        catalog: &Catalog,
        document_id: &str,
        segment_id: SegmentId,
        segment: &DocumentSegment,
    ) -> Result<Catalog> {
        let bytes = SegmentWriter::new(&self.storage, segment_id, self.config.compression)?
            .write(segment)?;
        debug!(document_id, segment = %segment_id, bytes, "wrote segment");

        let next = catalog.with_document(document_id, segment_id);
        next.save(&self.storage)?;
        Ok(next)
    }

    fn discard_segment(&self, segment_id: SegmentId) {
        let path = self.storage.segment_path(&segment_id);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "could not remove segment"),
        }
    }
}
