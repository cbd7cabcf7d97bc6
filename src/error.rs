// Error types for each pipeline stage

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::lexer::TokenKind;

/// Failure to read the next token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character '{character}' at line {line}, col {col}")]
    UnexpectedCharacter {
        character: char,
        line: usize,
        col: usize,
    },
    #[error("token scanner failed at line {line}, col {col}: {message}")]
    Scanner {
        message: String,
        line: usize,
        col: usize,
    },
}

/// A token stream that does not fit the grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("expected {expected} but found {found} '{lexeme}' at line {line}, col {col}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        lexeme: String,
        line: usize,
        col: usize,
    },
    #[error(
        "invalid statement starting with {found} '{lexeme}' at line {line}, col {col}; \
         expected one of: set, print, log, if, while, writefile, appendfile, readfile, \
         deletefile, function, return or a function call"
    )]
    InvalidStatement {
        found: TokenKind,
        lexeme: String,
        line: usize,
        col: usize,
    },
    #[error("missing END for {construct} opened at line {line}, col {col}")]
    MissingEnd {
        construct: &'static str,
        line: usize,
        col: usize,
    },
    #[error("missing END for function '{name}' defined at line {line}, col {col}")]
    MissingFunctionEnd { name: String, line: usize, col: usize },
    #[error("nesting deeper than {limit} levels at line {line}, col {col}")]
    NestingTooDeep { limit: usize, line: usize, col: usize },
    #[error("integer literal '{lexeme}' out of range at line {line}, col {col}")]
    NumberOutOfRange {
        lexeme: String,
        line: usize,
        col: usize,
    },
}

/// Anything that stops source text from becoming a program.
///
/// Lexing is lazy and driven by the parser, so both stages surface here, but
/// they stay distinguishable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
}

impl ParseError {
    /// Line and column the error points at.
    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::Lex(
                LexError::UnexpectedCharacter { line, col, .. } | LexError::Scanner { line, col, .. },
            ) => (*line, *col),
            ParseError::Syntax(e) => match e {
                SyntaxError::UnexpectedToken { line, col, .. }
                | SyntaxError::InvalidStatement { line, col, .. }
                | SyntaxError::MissingEnd { line, col, .. }
                | SyntaxError::MissingFunctionEnd { line, col, .. }
                | SyntaxError::NestingTooDeep { line, col, .. }
                | SyntaxError::NumberOutOfRange { line, col, .. } => (*line, *col),
            },
        }
    }
}

/// Failures raised while executing a parsed program.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("undefined function '{name}'")]
    UndefinedFunction { name: String },
    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("unsupported operation: {left} {op} {right}")]
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {op}")]
    Overflow { op: &'static str },
    #[error("return outside of a function")]
    ReturnOutsideFunction,
    #[error("call depth exceeded {limit} nested calls in '{name}'")]
    CallDepthExceeded { name: String, limit: usize },
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write to standard output: {0}")]
    Output(#[source] io::Error),
    #[error("cannot write diagnostic record: {0}")]
    Diagnostic(#[source] io::Error),
    #[error("line {line}, col {col}: {source}")]
    At {
        line: usize,
        col: usize,
        #[source]
        source: Box<RuntimeError>,
    },
}

impl RuntimeError {
    /// Attach a statement position, keeping the innermost one if already set.
    pub fn at(self, line: usize, col: usize) -> Self {
        match self {
            located @ RuntimeError::At { .. } => located,
            other => RuntimeError::At {
                line,
                col,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any position wrapper removed.
    pub fn root(&self) -> &RuntimeError {
        match self {
            RuntimeError::At { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            RuntimeError::At { line, col, .. } => Some((*line, *col)),
            _ => None,
        }
    }
}

/// Top-level failure of a whole script run, mapped onto process exit codes.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl ScriptError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ScriptError::Source { .. } | ScriptError::LogFile { .. } => 1,
            ScriptError::Parse(_) => 2,
            ScriptError::Runtime(_) => 3,
        }
    }
}
