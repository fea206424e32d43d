//! Turns a highlighted page into per-span hits with word geometry.
//!
//! The highlighted text is split on whitespace; the n-th piece is the word
//! with sequence position n in the page's positional blob.

use tracing::debug;
use crate::core::error::Result;
use crate::core::types::{Coord, INVALID_COORD};
use crate::index::positional::PageGeometry;
use crate::query::highlight::{strip_markers, HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};
use crate::search::results::{PageMatch, SearchHit, WordHit};

pub const ELLIPSIS: &str = "...";

/// Word index ranges, inclusive, covered by highlight markers.
pub fn match_spans(words: &[&str]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i < words.len() {
        if !words[i].contains(HIGHLIGHT_OPEN) {
            i += 1;
            continue;
        }
        let end = (i..words.len())
            .find(|&j| words[j].contains(HIGHLIGHT_CLOSE))
            .unwrap_or(words.len() - 1);
        spans.push((i, end));
        i = end + 1;
    }

    spans
}

pub fn extract_hits(page: &PageMatch, context_words: usize) -> Result<Vec<SearchHit>> {
    let words: Vec<&str> = page.highlighted_text.split_whitespace().collect();
    let spans = match_spans(&words);
    if spans.is_empty() {
        return Ok(Vec::new());
    }

    let geometry = PageGeometry::decode(&page.word_infos)?;

    let hits = spans
        .into_iter()
        .map(|(start, end)| SearchHit {
            page_id: page.page_id.clone(),
            matched_text: strip_markers(&words[start..=end].join(" ")),
            before: format!("{}{}", ELLIPSIS, join_stripped(&words[start.saturating_sub(context_words)..start])),
            after: format!("{}{}", join_stripped(&words[end + 1..(end + 1 + context_words).min(words.len())]), ELLIPSIS),
            words: word_hits(page, &geometry, &words, start, end),
            score: page.score,
        })
        .collect();

    Ok(hits)
}

fn word_hits(page: &PageMatch, geometry: &PageGeometry, words: &[&str], start: usize, end: usize) -> Vec<WordHit> {
    geometry
        .words()
        .filter(|(_, cut)| (start..=end).contains(&(cut.sequence_pos as usize)))
        .filter_map(|(line, cut)| {
            let Some(word) = words.get(cut.sequence_pos as usize) else {
                debug!(
                    page_id = %page.page_id,
                    sequence_pos = cut.sequence_pos,
                    words = words.len(),
                    "sequence position beyond page text"
                );
                return None;
            };
            Some(WordHit {
                text: strip_markers(word),
                x: cut.start_x,
                y: line.y_pos,
                width: extent(cut.start_x, cut.end_x),
                height: line.height,
                sequence_pos: cut.sequence_pos,
                line_position: line.position,
            })
        })
        .collect()
}

fn extent(start: Coord, end: Coord) -> Coord {
    if start == INVALID_COORD || end == INVALID_COORD {
        INVALID_COORD
    } else {
        end.checked_sub(start).unwrap_or(INVALID_COORD)
    }
}

fn join_stripped(words: &[&str]) -> String {
    strip_markers(&words.join(" "))
}
