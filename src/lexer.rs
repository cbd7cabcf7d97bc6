// Lexer built on the pest token grammar

use std::fmt;

use pest::Parser;
use pest::error::ErrorVariant;
use pest_derive::Parser;

use crate::error::LexError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct TokenGrammar;

/// The kind of a lexical token.
///
/// Keywords are not distinct kinds: `set`, `if`, `end` and friends all lex as
/// [`TokenKind::Ident`] and the parser recognizes them case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Str,
    Number,
    Ident,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    EqEq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Semicolon,
    LParen,
    RParen,
    Comma,
    Eof,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Str => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Ident => "IDENT",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Assign => "EQUAL",
            TokenKind::EqEq => "EQEQ",
            TokenKind::NotEq => "NEQ",
            TokenKind::Gt => "GT",
            TokenKind::Lt => "LT",
            TokenKind::GtEq => "GTE",
            TokenKind::LtEq => "LTE",
            TokenKind::Semicolon => "SEMICOL",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Comma => "COMMA",
            TokenKind::Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, quotes included for string literals.
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    /// True when this is an identifier spelling `keyword` in any letter case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.lexeme.eq_ignore_ascii_case(keyword)
    }
}

/// What a single grammar match means to the lexer.
enum Matched {
    Skip,
    Newline,
    Token(TokenKind),
}

fn classify(rule: Rule) -> Option<Matched> {
    let matched = match rule {
        Rule::skip | Rule::comment => Matched::Skip,
        Rule::newline => Matched::Newline,
        Rule::eq_eq => Matched::Token(TokenKind::EqEq),
        Rule::gt_eq => Matched::Token(TokenKind::GtEq),
        Rule::lt_eq => Matched::Token(TokenKind::LtEq),
        Rule::not_eq => Matched::Token(TokenKind::NotEq),
        Rule::gt => Matched::Token(TokenKind::Gt),
        Rule::lt => Matched::Token(TokenKind::Lt),
        Rule::string => Matched::Token(TokenKind::Str),
        Rule::number => Matched::Token(TokenKind::Number),
        Rule::ident => Matched::Token(TokenKind::Ident),
        Rule::plus => Matched::Token(TokenKind::Plus),
        Rule::minus => Matched::Token(TokenKind::Minus),
        Rule::star => Matched::Token(TokenKind::Star),
        Rule::slash => Matched::Token(TokenKind::Slash),
        Rule::assign => Matched::Token(TokenKind::Assign),
        Rule::semicolon => Matched::Token(TokenKind::Semicolon),
        Rule::lparen => Matched::Token(TokenKind::LParen),
        Rule::rparen => Matched::Token(TokenKind::RParen),
        Rule::comma => Matched::Token(TokenKind::Comma),
        Rule::token => return None,
    };
    Some(matched)
}

/// Why no token could be read at the cursor.
enum Miss {
    /// No grammar rule starts with the character at the cursor.
    NoMatch,
    /// The grammar engine itself gave up, e.g. on a resource limit.
    Failed(String),
}

/// Lazy, single-pass token stream over a source text.
///
/// Yields `Ok(token)` for every significant token and finishes with exactly
/// one [`TokenKind::Eof`] token. The first lexical error is yielded once and
/// ends the stream.
pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            col: 1,
            finished: false,
        }
    }

    /// Match one grammar token at the cursor, returning what it is and its length in bytes.
    fn match_at_cursor(&self) -> Result<(Matched, usize), Miss> {
        let rest = &self.text[self.pos..];
        let mut pairs = TokenGrammar::parse(Rule::token, rest).map_err(|e| match e.variant {
            ErrorVariant::ParsingError { .. } => Miss::NoMatch,
            ErrorVariant::CustomError { message } => Miss::Failed(message),
        })?;
        let inner = pairs
            .next()
            .and_then(|token| token.into_inner().next())
            .ok_or(Miss::NoMatch)?;
        let len = inner.as_str().len();
        if len == 0 {
            return Err(Miss::NoMatch);
        }
        let matched = classify(inner.as_rule()).ok_or(Miss::NoMatch)?;
        Ok((matched, len))
    }

    fn advance_over(&mut self, matched: &str) {
        match matched.rfind('\n') {
            Some(last) => {
                self.line += matched.matches('\n').count();
                self.col = matched[last + 1..].chars().count() + 1;
            }
            None => self.col += matched.chars().count(),
        }
        self.pos += matched.len();
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while self.pos < self.text.len() {
            let (matched, len) = match self.match_at_cursor() {
                Ok(found) => found,
                Err(miss) => {
                    self.finished = true;
                    let (line, col) = (self.line, self.col);
                    let error = match miss {
                        Miss::NoMatch => LexError::UnexpectedCharacter {
                            character: self.text[self.pos..].chars().next().unwrap_or('\0'),
                            line,
                            col,
                        },
                        Miss::Failed(message) => LexError::Scanner { message, line, col },
                    };
                    return Some(Err(error));
                }
            };

            let text = self.text;
            let lexeme = &text[self.pos..self.pos + len];
            let (line, col) = (self.line, self.col);

            match matched {
                Matched::Newline => {
                    self.line += 1;
                    self.col = 1;
                    self.pos += len;
                }
                Matched::Skip => self.advance_over(lexeme),
                Matched::Token(kind) => {
                    let token = Token {
                        kind,
                        lexeme: lexeme.to_string(),
                        line,
                        col,
                    };
                    self.advance_over(lexeme);
                    tracing::trace!(kind = %token.kind, lexeme = %token.lexeme, line, col, "token");
                    return Some(Ok(token));
                }
            }
        }

        self.finished = true;
        Some(Ok(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            line: self.line,
            col: self.col,
        }))
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

/// Start lexing `text`. Nothing is scanned until the iterator is polled.
pub fn tokenize(text: &str) -> Lexer<'_> {
    Lexer::new(text)
}

/// Lex `text` to completion, stopping at the first lexical error.
pub fn tokenize_all(text: &str) -> Result<Vec<Token>, LexError> {
    tokenize(text).collect()
}
