use serde::{Deserialize, Serialize};
use crate::index::inverted::EntryId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub entry: EntryId,
    pub term_freq: u32,       // Occurrences in the entry
    pub positions: Vec<u32>,  // Token positions for phrase matching, ascending
}

/// Posting list for a term
/// Note: Sorted by entry id so lists can be merged linearly
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    pub postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    pub fn add_posting(&mut self, posting: Posting) {
        match self.postings.binary_search_by_key(&posting.entry, |p| p.entry) {
            Ok(pos) => {
                self.postings[pos] = posting;
            }
            Err(pos) => {
                self.postings.insert(pos, posting);
            }
        }
    }

    /// Drop the posting for `entry`, returning its term frequency.
    pub fn remove_entry(&mut self, entry: EntryId) -> Option<u32> {
        let pos = self.postings.binary_search_by_key(&entry, |p| p.entry).ok()?;
        Some(self.postings.remove(pos).term_freq)
    }

    pub fn get(&self, entry: EntryId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&entry, |p| p.entry)
            .ok()
            .map(|pos| &self.postings[pos])
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.term_freq as u64).sum()
    }

    /// Intersect two posting lists (linear merge)
    pub fn intersect(&self, other: &PostingList) -> Vec<Posting> {
        let mut result = Vec::new();
        let mut i = 0;
        let mut j = 0;

        while i < self.postings.len() && j < other.postings.len() {
            let entry1 = self.postings[i].entry;
            let entry2 = other.postings[j].entry;

            if entry1 == entry2 {
                result.push(self.postings[i].clone());
                i += 1;
                j += 1;
            } else if entry1 < entry2 {
                i += 1;
            } else {
                j += 1;
            }
        }

        result
    }
}
