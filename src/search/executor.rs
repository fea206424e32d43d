use std::collections::HashMap;
use tracing::warn;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::Result;
use crate::index::entry::IndexEntry;
use crate::index::inverted::InvertedIndex;
use crate::query::highlight::highlight;
use crate::query::matcher::{PhraseHit, QueryMatcher};
use crate::query::parser::QueryParser;
use crate::scoring::scorer::{DocStats, Scorer, TermStats};
use crate::search::hits::extract_hits;
use crate::search::results::{PageMatch, ScoredEntry, SearchHit, TopKCollector};

/// Runs queries against one document's pages
pub struct QueryExecutor<'a> {
    pub index: &'a InvertedIndex,
    pub analyzer: &'a Analyzer,
    pub scorer: &'a dyn Scorer,
    parser: QueryParser,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(index: &'a InvertedIndex, analyzer: &'a Analyzer, scorer: &'a dyn Scorer) -> Self {
        QueryExecutor {
            index,
            analyzer,
            scorer,
            parser: QueryParser::new(),
        }
    }

    /// Best-scoring pages of `document_id`, highlighted. `entries` are the
    /// document's stored index entries.
    pub fn search_pages(
        &self,
        query_str: &str,
        document_id: &str,
        entries: &[IndexEntry],
        limit: usize,
    ) -> Result<Vec<PageMatch>> {
        let query = self.parser.parse(query_str)?;
        let matches = QueryMatcher::new(self.index, self.analyzer).execute(&query, document_id)?;

        let corpus = DocStats {
            doc_length: 0,
            avg_doc_length: self.index.avg_entry_length(),
            total_docs: self.index.entry_count() as u32,
        };

        let mut collector = TopKCollector::new(limit);
        for (entry, hits) in &matches.entries {
            let Some(meta) = self.index.entry(*entry) else {
                continue;
            };
            let stats = DocStats { doc_length: meta.length, ..corpus };
            collector.collect(ScoredEntry {
                entry: *entry,
                page_id: meta.page_id.clone(),
                score: self.score(hits, &matches.leaf_doc_freqs, &stats),
            });
        }

        let mut pages = Vec::new();
        for scored in collector.get_results() {
            let Some(stored) = find_entry(entries, &scored.page_id) else {
                warn!(document_id, page_id = %scored.page_id, "indexed page has no stored entry");
                continue;
            };
            let Some(hits) = matches.entries.get(&scored.entry) else {
                continue;
            };

            let tokens = self.analyzer.analyze(&stored.text);
            pages.push(PageMatch {
                page_id: scored.page_id,
                highlighted_text: highlight(&stored.text, &tokens, hits),
                word_infos: stored.word_infos.clone(),
                score: scored.score,
            });
        }

        Ok(pages)
    }

    /// Page matches broken into per-span hits with word geometry.
    pub fn search(
        &self,
        query_str: &str,
        document_id: &str,
        entries: &[IndexEntry],
        limit: usize,
        context_words: usize,
    ) -> Result<Vec<SearchHit>> {
        let mut hits = Vec::new();
        for page in self.search_pages(query_str, document_id, entries, limit)? {
            hits.extend(extract_hits(&page, context_words)?);
        }
        Ok(hits)
    }

    /// Sum of per-leaf scores; a leaf's frequency is its number of instances.
    fn score(&self, hits: &[PhraseHit], leaf_doc_freqs: &[u32], stats: &DocStats) -> f32 {
        let mut term_freqs: HashMap<usize, u32> = HashMap::new();
        for hit in hits {
            *term_freqs.entry(hit.leaf).or_insert(0) += 1;
        }

        term_freqs
            .into_iter()
            .map(|(leaf, tf)| {
                let doc_freq = leaf_doc_freqs.get(leaf).copied().unwrap_or(1);
                self.scorer.score(tf, &TermStats { doc_freq }, stats)
            })
            .sum()
    }
}

fn find_entry<'e>(entries: &'e [IndexEntry], page_id: &str) -> Option<&'e IndexEntry> {
    match entries.binary_search_by(|e| e.page_id.as_str().cmp(page_id)) {
        Ok(pos) => Some(&entries[pos]),
        Err(_) => entries.iter().find(|e| e.page_id == page_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::scoring::scorer::BM25Scorer;

    struct Fixture {
        index: InvertedIndex,
        analyzer: Analyzer,
        scorer: BM25Scorer,
        entries: Vec<IndexEntry>,
    }

    fn fixture(pages: &[(&str, &str)]) -> Fixture {
        let analyzer = Analyzer::standard_english();
        let mut index = InvertedIndex::new();
        let mut entries = Vec::new();
        for (page_id, text) in pages {
            index.add_entry("book", page_id, &analyzer.analyze(text));
            entries.push(IndexEntry {
                page_id: page_id.to_string(),
                text: text.to_string(),
                word_infos: String::new(),
            });
        }
        Fixture { index, analyzer, scorer: BM25Scorer::default(), entries }
    }

    impl Fixture {
        fn pages(&self, query: &str, limit: usize) -> Result<Vec<PageMatch>> {
            QueryExecutor::new(&self.index, &self.analyzer, &self.scorer)
                .search_pages(query, "book", &self.entries, limit)
        }
    }

    #[test]
    fn ranks_and_highlights() {
        let f = fixture(&[
            ("p1", "a fox in the woods near the river bank at dusk"),
            ("p2", "fox fox"),
            ("p3", "nothing here"),
        ]);

        let pages = f.pages("fox", 10).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_id, "p2");
        assert_eq!(pages[0].highlighted_text, "<hi>fox</hi> <hi>fox</hi>");
        assert_eq!(pages[1].highlighted_text, "a <hi>fox</hi> in the woods near the river bank at dusk");
        assert!(pages[0].score > pages[1].score);
    }

    #[test]
    fn ties_break_by_page_and_limit_applies() {
        let f = fixture(&[("p3", "owl"), ("p1", "owl"), ("p2", "owl")]);
        let pages: Vec<String> = f.pages("owl", 2).unwrap().into_iter().map(|p| p.page_id).collect();
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn excluded_terms_are_not_highlighted() {
        let f = fixture(&[("p1", "red fox"), ("p2", "red owl")]);
        let pages = f.pages("red NOT owl", 10).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].highlighted_text, "<hi>red</hi> fox");
    }

    #[test]
    fn syntax_errors_surface() {
        let f = fixture(&[("p1", "red fox")]);
        assert_eq!(f.pages("\"red", 10).unwrap_err().kind(), ErrorKind::Query);
    }
}
