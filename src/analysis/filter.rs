use crate::analysis::token::Token;

pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    fn name(&self) -> &str;

    /// Whether the filter also runs on the trailing term of a prefix query.
    /// Filters that rewrite word endings must not.
    fn applies_to_prefix(&self) -> bool {
        true
    }
}
