use std::collections::{BTreeMap, HashSet};
use crate::analysis::analyzer::{Analyzer, QueryTerm};
use crate::core::error::{Error, Result};
use crate::index::inverted::{EntryId, InvertedIndex};
use crate::query::ast::{PhraseQuery, Query};

/// First and last token position of one phrase instance, inclusive.
pub type Span = (u32, u32);

/// One matched phrase instance inside an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseHit {
    pub leaf: usize,    // Index into Query::phrases()
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Default)]
pub struct MatchSet {
    /// Matching entries of the target document with the hits that made them match.
    pub entries: BTreeMap<EntryId, Vec<PhraseHit>>,
    /// Per leaf, the number of entries in the whole corpus it matches.
    pub leaf_doc_freqs: Vec<u32>,
}

/// Evaluates a query against the inverted index.
pub struct QueryMatcher<'a> {
    index: &'a InvertedIndex,
    analyzer: &'a Analyzer,
}

impl<'a> QueryMatcher<'a> {
    pub fn new(index: &'a InvertedIndex, analyzer: &'a Analyzer) -> Self {
        QueryMatcher { index, analyzer }
    }

    /// Match `query` against the entries of `document_id`. Leaf statistics
    /// are corpus-wide.
    pub fn execute(&self, query: &Query, document_id: &str) -> Result<MatchSet> {
        let scope: HashSet<EntryId> = self.index
            .document_entries(document_id)
            .iter()
            .copied()
            .collect();

        let phrases = query.phrases();
        let mut leaves = Vec::with_capacity(phrases.len());
        let mut leaf_doc_freqs = Vec::with_capacity(phrases.len());

        for phrase in phrases {
            let mut matches = self.match_phrase(phrase)?;
            leaf_doc_freqs.push(matches.len() as u32);
            matches.retain(|entry, _| scope.contains(entry));
            leaves.push(matches);
        }

        let mut next_leaf = 0;
        let entries = evaluate(query, &leaves, &mut next_leaf);

        Ok(MatchSet { entries, leaf_doc_freqs })
    }

    fn match_phrase(&self, phrase: &PhraseQuery) -> Result<BTreeMap<EntryId, Vec<Span>>> {
        let terms = self.analyzer.analyze_query(&phrase.text, phrase.prefix);
        if terms.is_empty() {
            return Err(Error::query(format!("'{}' has no searchable terms", phrase.text)));
        }

        let positions: Vec<BTreeMap<EntryId, Vec<u32>>> = terms
            .iter()
            .map(|term| self.term_positions(term))
            .collect();

        let mut result = BTreeMap::new();
        let Some((first, rest)) = positions.split_first() else {
            return Ok(result);
        };

        for (entry, starts) in first {
            let Some(others) = rest.iter().map(|p| p.get(entry)).collect::<Option<Vec<_>>>() else {
                continue;
            };

            let spans: Vec<Span> = starts
                .iter()
                .copied()
                .filter(|&start| {
                    others.iter().enumerate().all(|(i, positions)| {
                        positions.binary_search(&(start + i as u32 + 1)).is_ok()
                    })
                })
                .map(|start| (start, start + rest.len() as u32))
                .collect();

            if !spans.is_empty() {
                result.insert(*entry, spans);
            }
        }

        Ok(result)
    }

    /// Entry -> ascending token positions of a term, or of every term
    /// starting with it for prefix terms.
    fn term_positions(&self, term: &QueryTerm) -> BTreeMap<EntryId, Vec<u32>> {
        let mut out: BTreeMap<EntryId, Vec<u32>> = BTreeMap::new();

        if !term.prefix {
            if let Some(list) = self.index.search_term(&term.text) {
                for posting in &list.postings {
                    out.insert(posting.entry, posting.positions.clone());
                }
            }
            return out;
        }

        for (_, list) in self.index.prefix_terms(&term.text) {
            for posting in &list.postings {
                out.entry(posting.entry)
                    .or_default()
                    .extend_from_slice(&posting.positions);
            }
        }
        for positions in out.values_mut() {
            positions.sort_unstable();
            positions.dedup();
        }
        out
    }
}

/// Walks the query in the same order as `Query::phrases`, so leaf indices line up.
fn evaluate(
    query: &Query,
    leaves: &[BTreeMap<EntryId, Vec<Span>>],
    next_leaf: &mut usize,
) -> BTreeMap<EntryId, Vec<PhraseHit>> {
    match query {
        Query::Phrase(_) => {
            let leaf = *next_leaf;
            *next_leaf += 1;
            leaves
                .get(leaf)
                .map(|matches| {
                    matches.iter()
                        .map(|(entry, spans)| {
                            let hits = spans.iter()
                                .map(|&(start, end)| PhraseHit { leaf, start, end })
                                .collect();
                            (*entry, hits)
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
        Query::And(children) => {
            let results: Vec<_> = children.iter()
                .map(|child| evaluate(child, leaves, next_leaf))
                .collect();
            let mut results = results.into_iter();
            let mut acc = results.next().unwrap_or_default();
            for next in results {
                acc = intersect(acc, next);
            }
            acc
        }
        Query::Or(children) => {
            let mut acc: BTreeMap<EntryId, Vec<PhraseHit>> = BTreeMap::new();
            for child in children {
                for (entry, hits) in evaluate(child, leaves, next_leaf) {
                    acc.entry(entry).or_default().extend(hits);
                }
            }
            acc
        }
        Query::Not(include, exclude) => {
            let mut matched = evaluate(include, leaves, next_leaf);
            let excluded = evaluate(exclude, leaves, next_leaf);
            matched.retain(|entry, _| !excluded.contains_key(entry));
            matched
        }
    }
}

fn intersect(
    mut left: BTreeMap<EntryId, Vec<PhraseHit>>,
    mut right: BTreeMap<EntryId, Vec<PhraseHit>>,
) -> BTreeMap<EntryId, Vec<PhraseHit>> {
    left.retain(|entry, _| right.contains_key(entry));
    for (entry, hits) in left.iter_mut() {
        if let Some(more) = right.remove(entry) {
            hits.extend(more);
        }
    }
    left
}
