use std::ops::Range;
use crate::analysis::token::Token;
use crate::query::matcher::PhraseHit;

pub const HIGHLIGHT_OPEN: &str = "<hi>";
pub const HIGHLIGHT_CLOSE: &str = "</hi>";

/// Wrap every hit in `text` with highlight markers.
///
/// `tokens` must come from analyzing `text` with the analyzer used at index
/// time; hit positions index into them. Overlapping regions are merged.
pub fn highlight(text: &str, tokens: &[Token], hits: &[PhraseHit]) -> String {
    let mut regions: Vec<Range<usize>> = hits
        .iter()
        .filter_map(|hit| {
            let first = token_at(tokens, hit.start)?;
            let last = token_at(tokens, hit.end)?;
            Some(first.offset..last.span().end)
        })
        .filter(|r| r.start < r.end && r.end <= text.len())
        .collect();
    regions.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(regions.len());
    for region in regions {
        match merged.last_mut() {
            Some(last) if region.start < last.end => {
                last.end = last.end.max(region.end);
            }
            _ => merged.push(region),
        }
    }

    let mut out = String::with_capacity(text.len() + merged.len() * 9);
    let mut cursor = 0;
    for region in merged {
        out.push_str(&text[cursor..region.start]);
        out.push_str(HIGHLIGHT_OPEN);
        out.push_str(&text[region.clone()]);
        out.push_str(HIGHLIGHT_CLOSE);
        cursor = region.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Remove highlight markers.
pub fn strip_markers(text: &str) -> String {
    text.replace(HIGHLIGHT_OPEN, "").replace(HIGHLIGHT_CLOSE, "")
}

fn token_at(tokens: &[Token], position: u32) -> Option<&Token> {
    match tokens.get(position as usize) {
        Some(token) if token.position == position => Some(token),
        _ => tokens.iter().find(|t| t.position == position),
    }
}
