pub mod ast;
pub mod highlight;
pub mod matcher;
pub mod parser;
