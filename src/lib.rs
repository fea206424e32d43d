pub mod core;
pub mod storage;
pub mod analysis;
pub mod parser;
pub mod index;
pub mod scoring;
pub mod search;
pub mod query;
pub mod writer;
pub mod compression;

pub use crate::core::config::Config;
pub use crate::core::database::{Database, IngestOutcome};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::stats::DatabaseStats;
pub use crate::core::types::{BBox, DocumentRecord, LineRecord, PageRecord, TermCount, INVALID_COORD};
pub use crate::search::results::{PageMatch, SearchHit, WordHit};
