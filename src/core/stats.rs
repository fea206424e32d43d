use serde::{Deserialize, Serialize};
use crate::search::autocomplete::CacheStats;

/// Store statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseStats {
    // Storage
    pub documents: usize,
    pub pages: usize,
    pub lines: usize,

    // Index
    pub index_entries: usize,
    pub distinct_terms: usize,
    pub total_tokens: u64,

    pub lexicon_cache: CacheStats,
}
