use rust_stemmers::Algorithm;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::diacritics::DiacriticFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};

/// Text analysis pipeline
///
/// The same analyzer must be used for indexing and querying, otherwise
/// token positions and highlight offsets drift apart.
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

/// One analyzed query term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub text: String,
    pub prefix: bool,
}

impl Analyzer {
    pub fn new(name: String, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name,
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens
    }

    /// Analyze a query word or phrase. With `prefix`, the last token is only
    /// normalized, not stemmed.
    pub fn analyze_query(&self, text: &str, prefix: bool) -> Vec<QueryTerm> {
        let mut terms: Vec<QueryTerm> = self.analyze(text)
            .into_iter()
            .map(|t| QueryTerm { text: t.text, prefix: false })
            .collect();

        if prefix {
            if let Some(last) = self.tokenizer.tokenize(text).pop() {
                let normalized = self.normalize_tokens(vec![last]);
                if let (Some(term), Some(token)) = (terms.last_mut(), normalized.into_iter().next()) {
                    term.text = token.text;
                    term.prefix = true;
                }
            }
        }

        terms
    }

    /// Lowercase and fold a free-form string the way prefixes are folded.
    pub fn normalize(&self, text: &str) -> String {
        let tokens = vec![Token::new(text.to_string(), 0, 0)];
        self.normalize_tokens(tokens)
            .into_iter()
            .next()
            .map(|t| t.text)
            .unwrap_or_default()
    }

    fn normalize_tokens(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        for filter in self.filters.iter().filter(|f| f.applies_to_prefix()) {
            tokens = filter.filter(tokens);
        }
        tokens
    }

    /// Lowercase, diacritic folding, English stemming.
    pub fn standard_english() -> Self {
        Analyzer::new("standard_english".to_string(),
                      Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
            .add_filter(Box::new(DiacriticFilter))
            .add_filter(Box::new(StemmerFilter::new(Algorithm::English)))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::standard_english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_and_folds() {
        let analyzer = Analyzer::standard_english();
        let terms: Vec<String> = analyzer.analyze("Jumping Élan")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(terms, vec!["jump", "elan"]);
    }

    #[test]
    fn prefix_term_is_not_stemmed() {
        let analyzer = Analyzer::standard_english();
        let terms = analyzer.analyze_query("Running quicki", true);

        assert_eq!(terms[0], QueryTerm { text: "run".into(), prefix: false });
        assert_eq!(terms[1], QueryTerm { text: "quicki".into(), prefix: true });
    }

    #[test]
    fn normalize_lowercases() {
        let analyzer = Analyzer::standard_english();
        assert_eq!(analyzer.normalize("BRÖ"), "bro");
    }
}
