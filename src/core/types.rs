use std::path::PathBuf;
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

/// Pixel coordinate on a page image.
pub type Coord = i32;

/// Reserved value for geometry the OCR markup did not provide.
pub const INVALID_COORD: Coord = -1;

/// Axis-aligned box in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: Coord,
    pub y: Coord,
    pub width: Coord,
    pub height: Coord,
}

impl BBox {
    pub const UNKNOWN: BBox = BBox {
        x: INVALID_COORD,
        y: INVALID_COORD,
        width: INVALID_COORD,
        height: INVALID_COORD,
    };

    /// Build from hOCR corner notation `x0 y0 x1 y1`. Corners whose
    /// extent does not fit a `Coord` give `UNKNOWN`.
    pub fn from_corners(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> Self {
        match (x1.checked_sub(x0), y1.checked_sub(y0)) {
            (Some(width), Some(height)) => BBox { x: x0, y: y0, width, height },
            _ => BBox::UNKNOWN,
        }
    }

    pub fn is_known(&self) -> bool {
        self.x != INVALID_COORD
            && self.y != INVALID_COORD
            && self.width != INVALID_COORD
            && self.height != INVALID_COORD
    }

    pub fn area(&self) -> i64 {
        if !self.is_known() {
            return 0;
        }
        self.width.max(0) as i64 * self.height.max(0) as i64
    }
}

/// Horizontal extent of one word plus its page-global rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCut {
    pub start_x: Coord,
    pub end_x: Coord,
    pub sequence_pos: u32,
}

/// Vertical extent of a line plus its ordinal on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInfo {
    pub y_pos: Coord,
    pub height: Coord,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub metadata: Option<serde_json::Value>,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub document_id: String,
    pub page_id: String,
    pub image_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub checksum: Option<String>,
}

/// One persisted line, flat per page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcription {
    pub page_id: String,
    pub position: u32,
    pub text: String,
    pub word_cuts: String,      // Encoded, see index::positional
    pub bbox: BBox,
}

/// Line as handed to viewers: text and its box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    pub text: String,
    pub x: Coord,
    pub y: Coord,
    pub width: Coord,
    pub height: Coord,
}

impl From<&Transcription> for LineRecord {
    fn from(t: &Transcription) -> Self {
        LineRecord {
            text: t.text.clone(),
            x: t.bbox.x,
            y: t.bbox.y,
            width: t.bbox.width,
            height: t.bbox.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}
