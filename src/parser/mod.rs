//! hOCR document parsing.
//!
//! [`HocrDocument`] walks the markup lazily; [`ParsedDocument`] is the owned,
//! thread-safe snapshot the writer consumes.

pub mod hocr;
pub mod title;

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::{BBox, WordCut};

pub use hocr::HocrDocument;

/// hOCR class names recognised by the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub page_classes: Vec<String>,
    pub line_classes: Vec<String>,
    pub word_classes: Vec<String>,
    pub skip_line_classes: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            page_classes: vec!["ocr_page".into()],
            line_classes: vec![
                "ocr_line".into(),
                "ocr_header".into(),
                "ocr_caption".into(),
                "ocr_textfloat".into(),
            ],
            word_classes: vec!["ocrx_word".into(), "ocr_cinfo".into()],
            skip_line_classes: vec!["not_aligned".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub page_id: String,
    pub width: u32,
    pub height: u32,
    pub image_path: PathBuf,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub bbox: BBox,
    pub word_cuts: Vec<WordCut>,
    pub text: String,
}

/// Everything the writer needs from one hOCR file.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub id: String,
    pub path: PathBuf,
    pub pages: Vec<ParsedPage>,
    pub lines: Vec<(String, Vec<ParsedLine>)>,
}

impl ParsedDocument {
    pub fn parse(path: &Path, config: &ParserConfig) -> Result<Self> {
        let document = HocrDocument::open(path, config)?;
        Ok(ParsedDocument {
            id: document.id().to_string(),
            path: document.path().to_path_buf(),
            pages: document.pages().collect(),
            lines: document.lines().collect(),
        })
    }
}

/// Document id from its file name; Google Books dumps name every file
/// `hOCR.html`, so those take the directory name.
pub fn document_id_for(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::parse(format!("no file name in {}", path.display())))?;

    if stem != "hOCR" {
        return Ok(stem.to_string());
    }

    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .map(String::from)
        .ok_or_else(|| Error::parse(format!("no parent directory for {}", path.display())))
}
