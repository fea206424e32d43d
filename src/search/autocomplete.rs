use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use fst::{IntoStreamer, Map, MapBuilder, Streamer};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Serialize, Deserialize};
use crate::core::error::Result;
use crate::core::types::TermCount;

/// Per-document term table: analyzed term -> occurrences in the document.
///
/// Stored as an FST so prefix completion is a range scan.
pub struct Lexicon {
    fst: Map<Vec<u8>>,
}

impl Lexicon {
    /// Serialize a term table. Keys come sorted out of the BTreeMap, which
    /// is what the FST builder requires.
    pub fn build(counts: &BTreeMap<String, u64>) -> Result<Vec<u8>> {
        let mut builder = MapBuilder::memory();
        for (term, count) in counts {
            builder.insert(term.as_bytes(), *count)?;
        }
        Ok(builder.into_inner()?)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Lexicon { fst: Map::new(bytes)? })
    }

    pub fn len(&self) -> usize {
        self.fst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fst.is_empty()
    }

    pub fn count(&self, term: &str) -> Option<u64> {
        self.fst.get(term)
    }

    /// Terms starting with `prefix` occurring at least `min_count` times,
    /// most frequent first, ties by term.
    pub fn complete(&self, prefix: &str, min_count: u64) -> Vec<TermCount> {
        let mut results = Vec::new();
        let prefix_bytes = prefix.as_bytes();

        let mut stream = self.fst.range().ge(prefix_bytes).into_stream();
        while let Some((term_bytes, count)) = stream.next() {
            if !term_bytes.starts_with(prefix_bytes) {
                break;
            }
            if count < min_count {
                continue;
            }
            if let Ok(term) = std::str::from_utf8(term_bytes) {
                results.push(TermCount { term: term.to_string(), count });
            }
        }

        results.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
        results
    }
}

/// This document's contribution per term: the corpus-wide count increase
/// between the two snapshots. Terms contributing less than `min_count` are
/// dropped.
pub fn term_frequencies(
    before: &BTreeMap<String, u64>,
    after: &BTreeMap<String, u64>,
    min_count: u64,
) -> BTreeMap<String, u64> {
    after
        .iter()
        .filter_map(|(term, &count)| {
            let previous = before.get(term).copied().unwrap_or(0);
            let local = count.saturating_sub(previous);
            (local > 0 && local >= min_count).then(|| (term.clone(), local))
        })
        .collect()
}

/// LRU of decoded term tables, keyed by document id
pub struct LexiconCache {
    cache: Mutex<LruCache<String, Arc<Lexicon>>>,
    capacity: usize,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

impl LexiconCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        LexiconCache {
            cache: Mutex::new(LruCache::new(cap)),
            capacity: cap.get(),
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    /// Cached table for `document_id`, loading it with `load` on a miss.
    /// `load` returns `None` for unknown documents; those are not cached.
    pub fn get_or_load<F>(&self, document_id: &str, load: F) -> Result<Option<Arc<Lexicon>>>
    where
        F: FnOnce() -> Result<Option<Vec<u8>>>,
    {
        if let Some(lexicon) = self.cache.lock().get(document_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(lexicon.clone()));
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let Some(bytes) = load()? else {
            return Ok(None);
        };
        let lexicon = Arc::new(Lexicon::from_bytes(bytes)?);
        self.cache.lock().put(document_id.to_string(), lexicon.clone());
        Ok(Some(lexicon))
    }

    pub fn invalidate(&self, document_id: &str) {
        self.cache.lock().pop(document_id);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.lock().len(),
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}
