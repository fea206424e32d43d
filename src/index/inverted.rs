use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use crate::analysis::token::Token;
use crate::index::posting::{Posting, PostingList};

/// Identifier of one (document, page) entry in the in-memory index.
pub type EntryId = u64;

#[derive(Debug, Clone)]
pub struct EntryMeta {
    pub document_id: String,
    pub page_id: String,
    pub length: u32,          // Tokens in the entry
    pub terms: Vec<String>,   // Distinct terms, for removal
}

/// Inverted index structure
///
/// Terms are kept ordered so prefix queries are a range scan. Alongside the
/// postings the index tracks total occurrences per term (the vocabulary
/// view autocomplete tables are derived from).
#[derive(Default)]
pub struct InvertedIndex {
    postings: BTreeMap<String, PostingList>,
    entries: HashMap<EntryId, EntryMeta>,
    by_document: HashMap<String, Vec<EntryId>>,
    vocabulary: HashMap<String, u64>,
    total_tokens: u64,
    next_entry: EntryId,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, document_id: &str, page_id: &str, tokens: &[Token]) -> EntryId {
        let entry = self.next_entry;
        self.next_entry += 1;

        let mut term_positions: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for token in tokens {
            term_positions.entry(token.text.as_str())
                .or_default()
                .push(token.position);
        }

        let mut terms = Vec::with_capacity(term_positions.len());
        for (term, positions) in term_positions {
            *self.vocabulary.entry(term.to_string()).or_insert(0) += positions.len() as u64;

            let posting = Posting {
                entry,
                term_freq: positions.len() as u32,
                positions,
            };
            self.postings.entry(term.to_string())
                .or_default()
                .add_posting(posting);
            terms.push(term.to_string());
        }

        self.entries.insert(entry, EntryMeta {
            document_id: document_id.to_string(),
            page_id: page_id.to_string(),
            length: tokens.len() as u32,
            terms,
        });
        self.by_document.entry(document_id.to_string())
            .or_default()
            .push(entry);
        self.total_tokens += tokens.len() as u64;

        entry
    }

    /// Remove every entry of a document. Returns the number removed.
    pub fn remove_document(&mut self, document_id: &str) -> usize {
        let Some(ids) = self.by_document.remove(document_id) else {
            return 0;
        };

        for id in &ids {
            let Some(meta) = self.entries.remove(id) else {
                continue;
            };

            for term in &meta.terms {
                let Some(list) = self.postings.get_mut(term) else {
                    continue;
                };
                if let Some(freq) = list.remove_entry(*id) {
                    decrement(&mut self.vocabulary, term, freq as u64);
                }
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
            self.total_tokens -= meta.length as u64;
        }

        ids.len()
    }

    pub fn search_term(&self, term: &str) -> Option<&PostingList> {
        self.postings.get(term)
    }

    /// Terms starting with `prefix`, in lexical order.
    pub fn prefix_terms<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a PostingList)> + 'a {
        self.postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(term, _)| term.starts_with(prefix))
            .map(|(term, list)| (term.as_str(), list))
    }

    /// Current corpus-wide occurrence count of each given term (0 if unseen).
    pub fn vocabulary_counts<'a, I>(&self, terms: I) -> BTreeMap<String, u64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        terms.into_iter()
            .map(|term| (term.to_string(), self.vocabulary.get(term).copied().unwrap_or(0)))
            .collect()
    }

    pub fn entry(&self, id: EntryId) -> Option<&EntryMeta> {
        self.entries.get(&id)
    }

    pub fn document_entries(&self, document_id: &str) -> &[EntryId] {
        self.by_document
            .get(document_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn avg_entry_length(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.total_tokens as f32 / self.entries.len() as f32
    }
}

fn decrement(vocabulary: &mut HashMap<String, u64>, term: &str, by: u64) {
    if let Some(count) = vocabulary.get_mut(term) {
        *count = count.saturating_sub(by);
        if *count == 0 {
            vocabulary.remove(term);
        }
    }
}
