//! Query language: barewords, `"quoted phrases"`, a trailing `*` for prefix
//! matching, implicit AND, explicit `AND`/`OR`/`NOT`, and parentheses.
//! `NOT` binds tighter than `AND`, which binds tighter than `OR`.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, value},
    sequence::{delimited, pair, preceded},
};
use crate::core::error::{Error, Result};
use crate::query::ast::{PhraseQuery, Query};

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Word { text: String, prefix: bool },
    Phrase { text: String, prefix: bool },
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl Lexeme {
    fn describe(&self) -> String {
        match self {
            Lexeme::Word { text, .. } => format!("'{}'", text),
            Lexeme::Phrase { text, .. } => format!("\"{}\"", text),
            Lexeme::And => "AND".into(),
            Lexeme::Or => "OR".into(),
            Lexeme::Not => "NOT".into(),
            Lexeme::LParen => "'('".into(),
            Lexeme::RParen => "')'".into(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '(' | ')' | '*')
}

fn word(input: &str) -> IResult<&str, Lexeme> {
    map(
        pair(take_while1(is_word_char), opt(char('*'))),
        |(text, star): (&str, Option<char>)| match (text, star) {
            ("AND", None) => Lexeme::And,
            ("OR", None) => Lexeme::Or,
            ("NOT", None) => Lexeme::Not,
            _ => Lexeme::Word { text: text.to_string(), prefix: star.is_some() },
        },
    ).parse(input)
}

fn phrase(input: &str) -> IResult<&str, Lexeme> {
    map(
        pair(delimited(char('"'), take_while(|c: char| c != '"'), char('"')), opt(char('*'))),
        |(text, star): (&str, Option<char>)| Lexeme::Phrase {
            text: text.to_string(),
            prefix: star.is_some(),
        },
    ).parse(input)
}

fn lexeme(input: &str) -> IResult<&str, Lexeme> {
    preceded(
        multispace0,
        alt((
            phrase,
            value(Lexeme::LParen, char('(')),
            value(Lexeme::RParen, char(')')),
            word,
        )),
    ).parse(input)
}

fn lex(input: &str) -> Result<Vec<Lexeme>> {
    let mut lexemes = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        match lexeme(rest) {
            Ok((next, lexeme)) => {
                lexemes.push(lexeme);
                rest = next.trim_start();
            }
            Err(_) if rest.starts_with('"') => {
                return Err(Error::query(format!("unterminated quote in '{}'", input)));
            }
            Err(_) => {
                return Err(Error::query(format!("unexpected input '{}' in '{}'", rest, input)));
            }
        }
    }

    Ok(lexemes)
}

/// Query parser for converting query strings to the AST
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        QueryParser
    }

    pub fn parse(&self, input: &str) -> Result<Query> {
        let lexemes = lex(input)?;
        if lexemes.is_empty() {
            return Err(Error::query("empty query"));
        }

        let mut state = ParseState { lexemes: &lexemes, pos: 0 };
        let query = state.or_expr()?;

        match state.peek() {
            None => Ok(query),
            Some(Lexeme::RParen) => Err(Error::query(format!("unbalanced ')' in '{}'", input))),
            Some(other) => Err(Error::query(format!("unexpected {} in '{}'", other.describe(), input))),
        }
    }
}

struct ParseState<'a> {
    lexemes: &'a [Lexeme],
    pos: usize,
}

impl<'a> ParseState<'a> {
    fn peek(&self) -> Option<&'a Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Lexeme> {
        let lexeme = self.lexemes.get(self.pos);
        self.pos += 1;
        lexeme
    }

    fn or_expr(&mut self) -> Result<Query> {
        let mut children = vec![self.and_expr()?];
        while self.peek() == Some(&Lexeme::Or) {
            self.advance();
            children.push(self.and_expr()?);
        }
        Ok(flatten(children, Query::Or))
    }

    fn and_expr(&mut self) -> Result<Query> {
        let mut children = vec![self.not_expr()?];
        loop {
            match self.peek() {
                Some(Lexeme::And) => {
                    self.advance();
                    children.push(self.not_expr()?);
                }
                // Adjacent expressions are an implicit AND
                Some(Lexeme::Word { .. } | Lexeme::Phrase { .. } | Lexeme::LParen) => {
                    children.push(self.not_expr()?);
                }
                _ => break,
            }
        }
        Ok(flatten(children, Query::And))
    }

    fn not_expr(&mut self) -> Result<Query> {
        let mut query = self.primary()?;
        while self.peek() == Some(&Lexeme::Not) {
            self.advance();
            let excluded = self.primary()?;
            query = Query::Not(Box::new(query), Box::new(excluded));
        }
        Ok(query)
    }

    fn primary(&mut self) -> Result<Query> {
        match self.advance() {
            Some(Lexeme::Word { text, prefix }) | Some(Lexeme::Phrase { text, prefix }) => {
                Ok(Query::Phrase(PhraseQuery { text: text.clone(), prefix: *prefix }))
            }
            Some(Lexeme::LParen) => {
                let inner = self.or_expr()?;
                match self.advance() {
                    Some(Lexeme::RParen) => Ok(inner),
                    _ => Err(Error::query("unbalanced '(' in query")),
                }
            }
            Some(other) => Err(Error::query(format!("expected a term, found {}", other.describe()))),
            None => Err(Error::query("query ends where a term was expected")),
        }
    }
}

fn flatten(mut children: Vec<Query>, combine: fn(Vec<Query>) -> Query) -> Query {
    if children.len() == 1 {
        children.remove(0)
    } else {
        combine(children)
    }
}
