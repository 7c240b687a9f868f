//! Lexical analysis for Pati
//!
//! Converts source text into a flat stream of tokens, one `Eol` per source line.

mod line_scanner;
mod token;

pub use line_scanner::LineScanner;
pub use token::{Token, TokenKind};
