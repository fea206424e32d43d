use std::collections::BinaryHeap;
use std::cmp::Ordering;
use serde::{Serialize, Deserialize};
use crate::core::types::{BBox, Coord, INVALID_COORD};
use crate::index::inverted::EntryId;

/// One matching page: highlighted text plus its positional blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMatch {
    pub page_id: String,
    pub highlighted_text: String,   // Matches wrapped in <hi>...</hi>
    pub word_infos: String,         // Encoded, see index::positional
    pub score: f32,                 // BM25, higher is better
}

/// Geometry of one matched word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordHit {
    pub text: String,
    pub x: Coord,
    pub y: Coord,
    pub width: Coord,
    pub height: Coord,
    pub sequence_pos: u32,
    pub line_position: u32,
}

impl WordHit {
    pub fn bbox(&self) -> BBox {
        BBox { x: self.x, y: self.y, width: self.width, height: self.height }
    }
}

/// One contiguous highlighted span with its context and word boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub page_id: String,
    pub matched_text: String,
    pub before: String,
    pub after: String,
    pub words: Vec<WordHit>,
    pub score: f32,
}

impl SearchHit {
    /// Union of the known word boxes, or `BBox::UNKNOWN` if there are none.
    pub fn bbox(&self) -> BBox {
        let known = self.words.iter().map(WordHit::bbox).filter(BBox::is_known);

        let mut union: Option<(Coord, Coord, Coord, Coord)> = None;
        for b in known {
            let (x0, y0, x1, y1) = (b.x, b.y, b.x.saturating_add(b.width), b.y.saturating_add(b.height));
            union = Some(match union {
                None => (x0, y0, x1, y1),
                Some((ux0, uy0, ux1, uy1)) => (ux0.min(x0), uy0.min(y0), ux1.max(x1), uy1.max(y1)),
            });
        }

        match union {
            Some((x0, y0, x1, y1)) => BBox::from_corners(x0, y0, x1, y1),
            None => BBox::UNKNOWN,
        }
    }

    pub fn has_geometry(&self) -> bool {
        self.words.iter().any(|w| w.x != INVALID_COORD)
    }
}

/// Entry with relevance score
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: EntryId,
    pub page_id: String,
    pub score: f32,
}

// Better entries order first: higher score, then lower page id
impl PartialEq for ScoredEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredEntry {}

impl PartialOrd for ScoredEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.score
            .total_cmp(&self.score)
            .then_with(|| self.page_id.cmp(&other.page_id))
    }
}

/// Top-K collector
///
/// The heap's maximum is the worst entry kept, so it is the one evicted.
pub struct TopKCollector {
    pub heap: BinaryHeap<ScoredEntry>,
    pub k: usize,
    pub total_collected: usize,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, scored: ScoredEntry) {
        self.total_collected += 1;

        self.heap.push(scored);
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    /// Best first.
    pub fn get_results(self) -> Vec<ScoredEntry> {
        self.heap.into_sorted_vec()
    }
}
