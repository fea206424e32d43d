/// Scorer trait
///
/// A "term" here is one query leaf: a word, phrase, or prefix, counted as
/// whole matched instances.
pub trait Scorer: Send + Sync {
    fn score(&self, term_freq: u32, term_stats: &TermStats, doc_stats: &DocStats) -> f32;

    fn name(&self) -> &str;
}

/// Corpus statistics for one query leaf
#[derive(Debug, Clone, Copy)]
pub struct TermStats {
    pub doc_freq: u32,        // Entries containing the leaf
}

/// Entry statistics for scoring
#[derive(Debug, Clone, Copy)]
pub struct DocStats {
    pub doc_length: u32,      // Tokens in the entry
    pub avg_doc_length: f32,  // Average entry length in the corpus
    pub total_docs: u32,      // Entries in the corpus
}

/// Smallest idf a leaf contributes, so very common terms still rank.
pub const MIN_IDF: f32 = 1e-6;

/// BM25 Scorer
pub struct BM25Scorer {
    pub k1: f32,  // Term frequency saturation (default: 1.2)
    pub b: f32,   // Length normalization strength (default: 0.75)
}

impl Default for BM25Scorer {
    fn default() -> Self {
        BM25Scorer {
            k1: 1.2,
            b: 0.75,
        }
    }
}

impl BM25Scorer {
    pub fn idf(&self, doc_freq: u32, total_docs: u32) -> f32 {
        let n = total_docs as f32;
        let df = doc_freq as f32;
        ((n - df + 0.5) / (df + 0.5)).ln().max(MIN_IDF)
    }
}

impl Scorer for BM25Scorer {
    fn score(&self, term_freq: u32, term_stats: &TermStats, doc_stats: &DocStats) -> f32 {
        if term_freq == 0 {
            return 0.0;
        }

        let tf = term_freq as f32;
        let idf = self.idf(term_stats.doc_freq, doc_stats.total_docs);
        let doc_len = doc_stats.doc_length as f32;
        let avg_doc_len = doc_stats.avg_doc_length.max(1.0);

        // BM25 formula
        let numerator = idf * tf * (self.k1 + 1.0);
        let denominator = tf + self.k1 * (1.0 - self.b + self.b * (doc_len / avg_doc_len));

        numerator / denominator
    }

    fn name(&self) -> &str {
        "bm25"
    }
}
