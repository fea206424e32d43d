use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::compression::compress::CompressionType;
use crate::core::error::Result;
use crate::parser::ParserConfig;
use crate::storage::wal::SyncMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_path: PathBuf,

    // Autocomplete
    pub autocomplete_min_count: u64,            // Terms below this are not persisted
    pub lexicon_cache_size: usize,              // LRU capacity, in documents

    // Search
    pub context_words: usize,                   // Words before/after a match
    pub default_search_limit: usize,

    // Writer
    pub segment_compression: CompressionType,
    pub wal_sync: SyncMode,
    pub wal_rotate_bytes: u64,
    pub ingest_threads: usize,                  // 0 = rayon default
    pub ingest_chunk_size: usize,               // Batch paths parsed per commit round, 0 = two per thread

    pub parser: ParserConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),

            autocomplete_min_count: 5,
            lexicon_cache_size: 5,

            context_words: 8,
            default_search_limit: 50,

            segment_compression: CompressionType::LZ4,
            wal_sync: SyncMode::Immediate,
            wal_rotate_bytes: 4 * 1024 * 1024,
            ingest_threads: 0,
            ingest_chunk_size: 0,

            parser: ParserConfig::default(),
        }
    }
}

impl Config {
    pub fn with_storage_path(path: impl Into<PathBuf>) -> Self {
        Config {
            storage_path: path.into(),
            ..Config::default()
        }
    }

    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }
}
