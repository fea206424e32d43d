use serde::{Serialize, Deserialize};

/// Token representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,      // The token text, after filters
    pub position: u32,     // Ordinal in the analyzed text (for phrase queries)
    pub offset: usize,     // Byte offset in original text
    pub length: usize,     // Byte length in original text
}

impl Token {
    pub fn new(text: String, position: u32, offset: usize) -> Self {
        let length = text.len();
        Token {
            text,
            position,
            offset,
            length,
        }
    }

    /// Byte range of the token in the text it was cut from.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length
    }
}
