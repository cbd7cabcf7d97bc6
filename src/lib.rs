//! # scriptlang
//!
//! A small statement-oriented scripting language: variables, arithmetic and
//! comparison expressions, `if`/`while` blocks, user functions and primitive
//! file I/O, executed by a tree-walking interpreter.
//!
//! The pipeline is lexer → parser → interpreter:
//!
//! ```no_run
//! use scriptlang::{diagnostics::NullSink, interpreter::Interpreter, parser::parse_script};
//!
//! let program = parse_script("set x = 2 + 3; print x").unwrap();
//! let mut interpreter = Interpreter::with_stdout(NullSink);
//! interpreter.run(&program).unwrap();
//! ```

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;
