use serde::{Serialize, Deserialize};

/// Parsed search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Phrase(PhraseQuery),            // Bareword or quoted phrase
    And(Vec<Query>),                // All must match
    Or(Vec<Query>),                 // At least one must match
    Not(Box<Query>, Box<Query>),    // Left matches, right does not
}

/// Word or phrase, matched as consecutive analyzed tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseQuery {
    pub text: String,
    pub prefix: bool,    // Last token matches as a prefix
}

impl Query {
    pub fn phrase(text: impl Into<String>) -> Self {
        Query::Phrase(PhraseQuery { text: text.into(), prefix: false })
    }

    pub fn prefix(text: impl Into<String>) -> Self {
        Query::Phrase(PhraseQuery { text: text.into(), prefix: true })
    }

    /// Leaves in left-to-right order.
    pub fn phrases(&self) -> Vec<&PhraseQuery> {
        let mut out = Vec::new();
        self.collect_phrases(&mut out);
        out
    }

    fn collect_phrases<'a>(&'a self, out: &mut Vec<&'a PhraseQuery>) {
        match self {
            Query::Phrase(p) => out.push(p),
            Query::And(children) | Query::Or(children) => {
                for child in children {
                    child.collect_phrases(out);
                }
            }
            Query::Not(left, right) => {
                left.collect_phrases(out);
                right.collect_phrases(out);
            }
        }
    }
}
