//! Scenario tag expressions: `@tag`, `not`, `and`, `or`
//!
//! `not` binds tightest, then `and`, then `or`. Parentheses are supported.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpr {
    /// Empty expression, matches everything
    Any,
    Tag(String),
    Not(Box<TagExpr>),
    And(Box<TagExpr>, Box<TagExpr>),
    Or(Box<TagExpr>, Box<TagExpr>),
}

impl TagExpr {
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        match self {
            TagExpr::Any => true,
            TagExpr::Tag(tag) => tags.iter().any(|t| t.as_ref() == tag),
            TagExpr::Not(inner) => !inner.matches(tags),
            TagExpr::And(a, b) => a.matches(tags) && b.matches(tags),
            TagExpr::Or(a, b) => a.matches(tags) || b.matches(tags),
        }
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagExpr::Any => Ok(()),
            TagExpr::Tag(tag) => f.write_str(tag),
            TagExpr::Not(inner) => write!(f, "not {}", inner),
            TagExpr::And(a, b) => write!(f, "({} and {})", a, b),
            TagExpr::Or(a, b) => write!(f, "({} or {})", a, b),
        }
    }
}

impl FromStr for TagExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens = tokenize(s)?;
        if tokens.is_empty() {
            return Ok(TagExpr::Any);
        }

        let mut parser = Parser {
            source: s,
            tokens,
            pos: 0,
        };
        let expr = parser.or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(parser.error(&format!("unexpected `{}`", token))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Tag(tag) => f.write_str(tag),
            Token::Not => f.write_str("not"),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

fn tokenize(s: &str) -> Result<Vec<Token>> {
    let spaced = s.replace('(', " ( ").replace(')', " ) ");
    spaced
        .split_whitespace()
        .map(|word| match word {
            "(" => Ok(Token::Open),
            ")" => Ok(Token::Close),
            w if w.eq_ignore_ascii_case("not") => Ok(Token::Not),
            w if w.eq_ignore_ascii_case("and") => Ok(Token::And),
            w if w.eq_ignore_ascii_case("or") => Ok(Token::Or),
            w if w.len() > 1 && w.starts_with('@') => Ok(Token::Tag(w.to_string())),
            w => Err(Error::configuration(format!(
                "Invalid tag expression `{}`: `{}` is not a tag",
                s, w
            ))),
        })
        .collect()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<TagExpr> {
        let mut expr = self.and()?;
        while self.eat(&Token::Or) {
            expr = TagExpr::Or(Box::new(expr), Box::new(self.and()?));
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<TagExpr> {
        let mut expr = self.unary()?;
        while self.eat(&Token::And) {
            expr = TagExpr::And(Box::new(expr), Box::new(self.unary()?));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<TagExpr> {
        match self.next() {
            Some(Token::Not) => Ok(TagExpr::Not(Box::new(self.unary()?))),
            Some(Token::Tag(tag)) => Ok(TagExpr::Tag(tag)),
            Some(Token::Open) => {
                let expr = self.or()?;
                if self.eat(&Token::Close) {
                    Ok(expr)
                } else {
                    Err(self.error("missing `)`"))
                }
            }
            Some(token) => Err(self.error(&format!("unexpected `{}`", token))),
            None => Err(self.error("unexpected end")),
        }
    }

    fn error(&self, detail: &str) -> Error {
        Error::configuration(format!("Invalid tag expression `{}`: {}", self.source, detail))
    }
}
