use std::collections::BTreeMap;
use chrono::Utc;
use crate::core::types::{DocumentRecord, PageRecord, Transcription};
use crate::index::entry::{build_entries, IndexEntry};
use crate::index::positional::encode_word_cuts;
use crate::parser::{ParsedDocument, ParsedLine};

/// Rows for one document, ready to commit
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub document: DocumentRecord,
    pub pages: Vec<PageRecord>,
    pub transcriptions: Vec<Transcription>,
    pub entries: Vec<IndexEntry>,
}

impl PreparedDocument {
    /// Build rows from parser output. Pages are ordered by id; a repeated
    /// page id replaces the earlier page. Lines of skipped pages are dropped.
    pub fn build(parsed: ParsedDocument, metadata: Option<serde_json::Value>) -> Self {
        let document_id = parsed.id.clone();

        let pages: BTreeMap<String, PageRecord> = parsed.pages
            .into_iter()
            .map(|page| {
                let record = PageRecord {
                    document_id: document_id.clone(),
                    page_id: page.page_id.clone(),
                    image_path: page.image_path,
                    width: page.width,
                    height: page.height,
                    checksum: page.checksum,
                };
                (page.page_id, record)
            })
            .collect();

        let lines: BTreeMap<String, Vec<ParsedLine>> = parsed.lines
            .into_iter()
            .filter(|(page_id, _)| pages.contains_key(page_id))
            .collect();

        let transcriptions: Vec<Transcription> = lines
            .iter()
            .flat_map(|(page_id, lines)| {
                lines.iter().enumerate().map(move |(position, line)| Transcription {
                    page_id: page_id.clone(),
                    position: position as u32,
                    text: line.text.clone(),
                    word_cuts: encode_word_cuts(&line.word_cuts),
                    bbox: line.bbox,
                })
            })
            .collect();

        let pages: Vec<PageRecord> = pages.into_values().collect();
        let entries = build_entries(&pages, &transcriptions);

        PreparedDocument {
            document: DocumentRecord {
                id: document_id,
                filename: parsed.path.to_string_lossy().into_owned(),
                metadata,
                ingested_at: Utc::now(),
            },
            pages,
            transcriptions,
            entries,
        }
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }
}
