//! Runtime execution for Pati programs

mod diagnostics;
mod interpreter;
mod value;
mod variables;

pub use diagnostics::Diagnostics;
pub use interpreter::{evaluate, Interpreter, RunReport};
pub use value::Value;
pub use variables::Variables;
