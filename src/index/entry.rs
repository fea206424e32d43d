use serde::{Serialize, Deserialize};
use crate::core::types::{LineInfo, PageRecord, Transcription};
use crate::index::positional::{encode_line, LINE_SEPARATOR};

/// Searchable unit: one page's text and its positional blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub page_id: String,
    pub text: String,         // Line texts joined by single spaces
    pub word_infos: String,   // Line fragments joined by "||"
}

impl IndexEntry {
    /// Build the entry for one page from its transcriptions, which must be
    /// in line-position order.
    pub fn from_lines<'a, I>(page_id: &str, lines: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Transcription>,
    {
        let mut texts = Vec::new();
        let mut fragments = Vec::new();

        for line in lines {
            let info = LineInfo {
                y_pos: line.bbox.y,
                height: line.bbox.height,
                position: line.position,
            };
            texts.push(line.text.as_str());
            fragments.push(encode_line(&line.word_cuts, &info));
        }

        if texts.is_empty() {
            return None;
        }

        Some(IndexEntry {
            page_id: page_id.to_string(),
            text: texts.join(" "),
            word_infos: fragments.join(LINE_SEPARATOR),
        })
    }
}

/// One entry per page that has lines, in page order.
pub fn build_entries(pages: &[PageRecord], transcriptions: &[Transcription]) -> Vec<IndexEntry> {
    pages
        .iter()
        .filter_map(|page| {
            let mut lines: Vec<&Transcription> = transcriptions
                .iter()
                .filter(|t| t.page_id == page.page_id)
                .collect();
            lines.sort_by_key(|t| t.position);
            IndexEntry::from_lines(&page.page_id, lines)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use crate::core::types::BBox;

    fn page(page_id: &str) -> PageRecord {
        PageRecord {
            document_id: "doc".into(),
            page_id: page_id.into(),
            image_path: PathBuf::from("/img.png"),
            width: 100,
            height: 100,
            checksum: None,
        }
    }

    fn line(page_id: &str, position: u32, text: &str, word_cuts: &str, bbox: BBox) -> Transcription {
        Transcription {
            page_id: page_id.into(),
            position,
            text: text.into(),
            word_cuts: word_cuts.into(),
            bbox,
        }
    }

    #[test]
    fn joins_lines_in_position_order() {
        let pages = vec![page("p1"), page("p2")];
        let lines = vec![
            line("p1", 1, "brown fox", "32:60:2 62:80:3", BBox { x: 32, y: 130, width: 48, height: 20 }),
            line("p1", 0, "the quick", "0:10:0 12:30:1", BBox { x: 0, y: 100, width: 30, height: 20 }),
        ];

        let entries = build_entries(&pages, &lines);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "the quick brown fox");
        assert_eq!(entries[0].word_infos, "0:10:0 12:30:1|100:20:0||32:60:2 62:80:3|130:20:1");
    }

    #[test]
    fn unknown_line_box_encodes_empty_fields() {
        let entry = IndexEntry::from_lines("p1", &[line("p1", 0, "x", ":5:0", BBox::UNKNOWN)]).unwrap();
        assert_eq!(entry.word_infos, ":5:0|::0");
    }
}
