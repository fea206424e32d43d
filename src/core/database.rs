use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use crate::analysis::analyzer::Analyzer;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::DatabaseStats;
use crate::core::types::{DocumentRecord, LineRecord, PageRecord, TermCount};
use crate::parser::ParsedDocument;
use crate::scoring::scorer::BM25Scorer;
use crate::search::autocomplete::LexiconCache;
use crate::search::executor::QueryExecutor;
use crate::search::results::{PageMatch, SearchHit};
use crate::storage::catalog::{Catalog, RecoveryManager};
use crate::storage::layout::StorageLayout;
use crate::storage::segment::DocumentSegment;
use crate::storage::segment_reader::SegmentReader;
use crate::writer::document::PreparedDocument;
use crate::writer::index_writer::{IndexState, IndexWriter, WriterConfig};

// Parsed documents held per worker thread during a batch
const PARSE_AHEAD_PER_THREAD: usize = 2;

/// Result of one file in a batch ingest
#[derive(Debug)]
pub struct IngestOutcome {
    pub path: PathBuf,
    pub result: Result<String>,
}

pub struct Database {
    config: Config,

    storage: Arc<StorageLayout>,
    analyzer: Arc<Analyzer>,
    scorer: BM25Scorer,

    state: RwLock<IndexState>,     // catalog + segments + inverted index
    writer: Mutex<IndexWriter>,    // wal, single writer
    lexicons: LexiconCache,
}

impl Database {
    /// Open or create the store at `config.storage_path`, recover from any
    /// interrupted ingest and rebuild the in-memory index.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(StorageLayout::new(config.storage_path.clone())?);
        let analyzer = Arc::new(Analyzer::standard_english());

        let catalog = Catalog::load(&storage)?;
        let (wal, report) = RecoveryManager::new(&storage, &catalog).recover(config.wal_sync)?;
        if !report.interrupted.is_empty() {
            warn!(documents = ?report.interrupted, "discarded interrupted ingests");
        }

        let loaded: Vec<Arc<DocumentSegment>> = catalog.documents
            .par_iter()
            .filter_map(|(document_id, segment_id)| {
                match SegmentReader::open(&storage, *segment_id).and_then(|r| r.read()) {
                    Ok(segment) => Some(Arc::new(segment)),
                    Err(e) => {
                        warn!(document_id = %document_id, segment = %segment_id, error = %e, "skipping unreadable segment");
                        None
                    }
                }
            })
            .collect();

        let mut state = IndexState {
            catalog,
            ..IndexState::default()
        };
        for segment in loaded {
            state.insert_segment(&analyzer, segment);
        }

        info!(
            path = %storage.base_dir.display(),
            documents = state.documents.len(),
            entries = state.index.entry_count(),
            "opened store"
        );

        let writer = IndexWriter::new(storage.clone(), wal, analyzer.clone(), WriterConfig::from(&config));

        Ok(Database {
            lexicons: LexiconCache::new(config.lexicon_cache_size),
            config,
            storage,
            analyzer,
            scorer: BM25Scorer::default(),
            state: RwLock::new(state),
            writer: Mutex::new(writer),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &StorageLayout {
        &self.storage
    }

    /// Ingest one hOCR file; returns the document id. Re-ingesting an id
    /// replaces the earlier version.
    pub fn ingest(&self, path: &Path) -> Result<String> {
        self.ingest_with_metadata(path, None)
    }

    pub fn ingest_with_metadata(&self, path: &Path, metadata: Option<serde_json::Value>) -> Result<String> {
        let parsed = ParsedDocument::parse(path, &self.config.parser)?;
        self.commit(PreparedDocument::build(parsed, metadata))
    }

    /// Parse in parallel, commit one at a time. Paths are taken in chunks
    /// so only one chunk of parsed documents is held at once. Each path gets
    /// its own outcome; a failing file does not stop the rest.
    pub fn ingest_batch<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<IngestOutcome> {
        let pool = if self.config.ingest_threads > 0 {
            match rayon::ThreadPoolBuilder::new().num_threads(self.config.ingest_threads).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "could not build ingest pool, using the global one");
                    None
                }
            }
        } else {
            None
        };

        let chunk_size = match self.config.ingest_chunk_size {
            0 => {
                let threads = pool.as_ref()
                    .map(|p| p.current_num_threads())
                    .unwrap_or_else(rayon::current_num_threads);
                threads * PARSE_AHEAD_PER_THREAD
            }
            n => n,
        };

        let mut outcomes = Vec::with_capacity(paths.len());
        for chunk in paths.chunks(chunk_size.max(1)) {
            let parse = || -> Vec<Result<PreparedDocument>> {
                chunk
                    .par_iter()
                    .map(|path| {
                        ParsedDocument::parse(path.as_ref(), &self.config.parser)
                            .map(|parsed| PreparedDocument::build(parsed, None))
                    })
                    .collect()
            };
            let prepared = match &pool {
                Some(pool) => pool.install(parse),
                None => parse(),
            };

            for (path, prepared) in chunk.iter().zip(prepared) {
                outcomes.push(IngestOutcome {
                    path: path.as_ref().to_path_buf(),
                    result: prepared.and_then(|p| self.commit(p)),
                });
            }
            debug!(committed = outcomes.len(), total = paths.len(), "batch chunk done");
        }

        outcomes
    }

    fn commit(&self, prepared: PreparedDocument) -> Result<String> {
        let document_id = prepared.id().to_string();

        let mut writer = self.writer.lock();
        let analyzed = writer.analyze(prepared);

        let mut state = self.state.write();
        writer.commit(&mut state, analyzed)?;
        self.lexicons.invalidate(&document_id);

        Ok(document_id)
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.state.read().documents.keys().cloned().collect()
    }

    pub fn get_document(&self, document_id: &str) -> Option<DocumentRecord> {
        self.segment(document_id).map(|s| s.document.clone())
    }

    pub fn get_pages(&self, document_id: &str) -> Vec<PageRecord> {
        self.segment(document_id)
            .map(|s| s.pages.clone())
            .unwrap_or_default()
    }

    pub fn get_page(&self, document_id: &str, page_id: &str) -> Option<PageRecord> {
        self.segment(document_id)?.page(page_id).cloned()
    }

    pub fn get_image_path(&self, document_id: &str, page_id: &str) -> Option<PathBuf> {
        self.get_page(document_id, page_id).map(|p| p.image_path)
    }

    /// Lines of a page in reading order.
    pub fn get_lines(&self, document_id: &str, page_id: &str) -> Vec<LineRecord> {
        self.segment(document_id)
            .map(|s| s.lines(page_id).map(LineRecord::from).collect())
            .unwrap_or_default()
    }

    /// Match spans with word geometry, best pages first. `limit` caps the
    /// number of pages and defaults to `default_search_limit`.
    pub fn search(&self, query: &str, document_id: &str, limit: Option<usize>) -> Result<Vec<SearchHit>> {
        let state = self.state.read();
        let entries = state.documents.get(document_id).map(|s| s.entries.as_slice()).unwrap_or(&[]);

        QueryExecutor::new(&state.index, &self.analyzer, &self.scorer).search(
            query,
            document_id,
            entries,
            limit.unwrap_or(self.config.default_search_limit),
            self.config.context_words,
        )
    }

    /// Highlighted pages, best first.
    pub fn search_pages(&self, query: &str, document_id: &str, limit: Option<usize>) -> Result<Vec<PageMatch>> {
        let state = self.state.read();
        let entries = state.documents.get(document_id).map(|s| s.entries.as_slice()).unwrap_or(&[]);

        QueryExecutor::new(&state.index, &self.analyzer, &self.scorer).search_pages(
            query,
            document_id,
            entries,
            limit.unwrap_or(self.config.default_search_limit),
        )
    }

    /// Terms of `document_id` starting with `prefix`, most frequent first.
    pub fn autocomplete(&self, prefix: &str, document_id: &str, min_count: u64) -> Result<Vec<TermCount>> {
        let prefix = self.analyzer.normalize(prefix.trim());
        if prefix.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument, "empty autocomplete prefix".to_string()));
        }

        let state = self.state.read();
        let lexicon = self.lexicons.get_or_load(document_id, || {
            Ok(state.documents.get(document_id).map(|s| s.lexicon.clone()))
        })?;

        Ok(lexicon
            .map(|lexicon| lexicon.complete(&prefix, min_count))
            .unwrap_or_default())
    }

    pub fn stats(&self) -> DatabaseStats {
        let state = self.state.read();
        DatabaseStats {
            documents: state.documents.len(),
            pages: state.documents.values().map(|s| s.pages.len()).sum(),
            lines: state.documents.values().map(|s| s.transcriptions.len()).sum(),
            index_entries: state.index.entry_count(),
            distinct_terms: state.index.term_count(),
            total_tokens: state.index.total_tokens(),
            lexicon_cache: self.lexicons.stats(),
        }
    }

    fn segment(&self, document_id: &str) -> Option<Arc<DocumentSegment>> {
        self.state.read().documents.get(document_id).cloned()
    }
}
