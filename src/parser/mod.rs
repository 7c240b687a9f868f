//! Pati Parser Module
//!
//! Builds the syntax tree of program lines, statements and expressions from
//! a token stream.

mod ast;
mod program_parser;

pub use ast::{
    AddOp, Argument, Block, Expression, Factor, MulOp, Operand, Program, ProgramLine, RelOp,
    Statement, Term, Variable, VARIABLE_COUNT,
};
pub use program_parser::ProgramParser;
