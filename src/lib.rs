//! # Pati - A Line-Oriented BASIC Dialect
//!
//! A small interpreter for a labelled, line-oriented BASIC-style language with
//! integer variables `A`-`Z`, named procedures and a single call stack.
//!
//! ## Quick Start
//!
//! ```rust
//! use pati::{Interpreter, Parser, Scanner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = "\
//! a LET A = 10
//! b LET B = 3
//! c PRINT \"total\", A * B + 2
//! d END
//! ";
//!
//! // Tokenize (scan)
//! let tokens = Scanner::new(code).scan_tokens();
//!
//! // Parse into the syntax tree
//! let program = Parser::new(tokens).parse()?;
//!
//! // Execute with in-memory I/O
//! let mut interpreter = Interpreter::new(std::io::empty(), Vec::new());
//! let report = interpreter.execute(&program);
//!
//! assert!(report.is_clean());
//! assert_eq!(interpreter.into_output(), b"total 32\n");
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! Every line starts with a label and holds one statement:
//!
//! - `LET V = expr` - assign an integer
//! - `IF expr relop expr THEN statement` - conditional, relops `= <> < <= > >=`
//! - `PRINT item, item` - print strings and expressions separated by spaces
//! - `INPUT V, W` - read integers from standard input
//! - `CALL name(V = value)` - bind arguments and enter a procedure
//! - `RETURN` / `END`
//!
//! Procedures are declared with `PROC name { ... }`. They share the single
//! variable namespace with the main program; running off the end of a body
//! returns to the caller.
//!
//! ## Procedures
//!
//! ```rust
//! use pati::{Interpreter, Parser, Scanner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = "\
//! main CALL square(N = 7)
//! done PRINT N
//! stop END
//! PROC square {
//!   sq LET N = N * N
//! }
//! ";
//!
//! let program = Parser::new(Scanner::new(code).scan_tokens()).parse()?;
//! let mut interpreter = Interpreter::new(std::io::empty(), Vec::new());
//! interpreter.execute(&program);
//!
//! assert_eq!(interpreter.into_output(), b"49\n");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Parse failures are returned as [`Error`]. Runtime faults are recorded in
//! the run's [`Diagnostics`] and execution carries on; a fatal one (call depth
//! exhausted, output failure) stops the run and lands in [`RunReport::fatal`]:
//!
//! ```rust
//! # use pati::{Interpreter, Parser, Scanner};
//! let program = Parser::new(Scanner::new("a PRINT 10 / 0").scan_tokens())
//!     .parse()
//!     .unwrap();
//! let mut interpreter = Interpreter::new(std::io::empty(), Vec::new());
//! let report = interpreter.execute(&program);
//!
//! // Division by zero makes the expression 0 and records code 10
//! assert_eq!(report.diagnostics.current_code(), 10);
//! assert!(report.fatal.is_none());
//! assert_eq!(interpreter.into_output(), b"0\n");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → Program → Interpreter → Output
//!                            └──→ Linter → Warnings
//! ```
//!
//! - [`Scanner`] - Tokenizes source text, one `Eol` per line
//! - [`Parser`] - Builds the [`Program`]: main lines plus named procedures
//! - [`Interpreter`] - Runs a program against a [`Variables`] store
//! - [`Linter`] - Token-level static checks

/// Version of the Pati interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod lexer;
pub mod lint;
pub mod options;
pub mod parser;
pub mod runtime;

// Re-export main types
pub use error::{Error, ErrorSeverity, Result};
pub use lexer::{LineScanner, Token, TokenKind};
pub use lint::{Linter, Warning};
pub use options::LanguageOptions;
pub use parser::{
    AddOp, Argument, Expression, Factor, MulOp, Operand, Program, ProgramLine, ProgramParser,
    RelOp, Statement, Term, Variable,
};
pub use runtime::{Diagnostics, Interpreter, RunReport, Value, Variables};

/// Type alias for the line scanner (lexer).
pub type Scanner = LineScanner;

/// Type alias for the program parser.
pub type Parser = ProgramParser;
