//! Positional blob: the per-page string that stores every word's horizontal
//! extent and page-global sequence position, grouped by line, alongside
//! each line's vertical extent.
//!
//! ```text
//! word  := start_x ":" end_x ":" sequence_pos
//! line  := word (" " word)* "|" y_pos ":" height ":" position
//! page  := line ("||" line)*
//! ```
//!
//! Invalid coordinates are written as empty fields. Positions are always
//! present. A line without words starts with `|`, so splitting on the
//! leftmost `||` keeps fragments intact.

use std::fmt::Write;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::{Coord, LineInfo, WordCut, INVALID_COORD};

pub const FIELD_SEPARATOR: char = ':';
pub const WORD_SEPARATOR: char = ' ';
pub const META_SEPARATOR: char = '|';
pub const LINE_SEPARATOR: &str = "||";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineGeometry {
    pub info: LineInfo,
    pub words: Vec<WordCut>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub lines: Vec<LineGeometry>,
}

impl PageGeometry {
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push_str(LINE_SEPARATOR);
            }
            out.push_str(&encode_line(&encode_word_cuts(&line.words), &line.info));
        }
        out
    }

    pub fn decode(blob: &str) -> Result<Self> {
        if blob.is_empty() {
            return Ok(PageGeometry::default());
        }

        let lines = blob
            .split(LINE_SEPARATOR)
            .map(decode_line)
            .collect::<Result<Vec<_>>>()?;

        Ok(PageGeometry { lines })
    }

    /// All word cuts of the page in line order.
    pub fn words(&self) -> impl Iterator<Item = (&LineInfo, &WordCut)> {
        self.lines
            .iter()
            .flat_map(|line| line.words.iter().map(move |w| (&line.info, w)))
    }
}

/// Encode the word cuts of one line (the `word_cuts` transcription column).
pub fn encode_word_cuts(words: &[WordCut]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(WORD_SEPARATOR);
        }
        push_coord(&mut out, word.start_x);
        out.push(FIELD_SEPARATOR);
        push_coord(&mut out, word.end_x);
        out.push(FIELD_SEPARATOR);
        let _ = write!(out, "{}", word.sequence_pos);
    }
    out
}

/// Append line metadata to already encoded word cuts.
pub fn encode_line(word_cuts: &str, info: &LineInfo) -> String {
    let mut out = String::with_capacity(word_cuts.len() + 16);
    out.push_str(word_cuts);
    out.push(META_SEPARATOR);
    push_coord(&mut out, info.y_pos);
    out.push(FIELD_SEPARATOR);
    push_coord(&mut out, info.height);
    out.push(FIELD_SEPARATOR);
    let _ = write!(out, "{}", info.position);
    out
}

pub fn decode_word_cuts(encoded: &str) -> Result<Vec<WordCut>> {
    encoded
        .split(WORD_SEPARATOR)
        .filter(|w| !w.is_empty())
        .map(|w| {
            let [start_x, end_x, sequence_pos] = split_fields(w)?;
            Ok(WordCut {
                start_x: parse_coord(start_x)?,
                end_x: parse_coord(end_x)?,
                sequence_pos: parse_position(sequence_pos)?,
            })
        })
        .collect()
}

fn decode_line(fragment: &str) -> Result<LineGeometry> {
    let (words, meta) = fragment
        .rsplit_once(META_SEPARATOR)
        .ok_or_else(|| Error::corrupt(format!("line fragment without metadata: '{}'", fragment)))?;

    if words.contains(META_SEPARATOR) {
        return Err(Error::corrupt(format!("stray separator in line fragment: '{}'", fragment)));
    }

    let [y_pos, height, position] = split_fields(meta)?;
    Ok(LineGeometry {
        info: LineInfo {
            y_pos: parse_coord(y_pos)?,
            height: parse_coord(height)?,
            position: parse_position(position)?,
        },
        words: decode_word_cuts(words)?,
    })
}

fn split_fields(s: &str) -> Result<[&str; 3]> {
    let mut parts = s.split(FIELD_SEPARATOR);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), None) => Ok([a, b, c]),
        _ => Err(Error::corrupt(format!("expected three fields in '{}'", s))),
    }
}

fn push_coord(out: &mut String, value: Coord) {
    if value != INVALID_COORD {
        let _ = write!(out, "{}", value);
    }
}

fn parse_coord(field: &str) -> Result<Coord> {
    if field.is_empty() {
        return Ok(INVALID_COORD);
    }
    field
        .parse()
        .map_err(|_| Error::corrupt(format!("invalid coordinate '{}'", field)))
}

fn parse_position(field: &str) -> Result<u32> {
    field
        .parse()
        .map_err(|_| Error::corrupt(format!("invalid position '{}'", field)))
}
