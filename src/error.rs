//! Error types for the Pati interpreter
//!
//! Every fault, structural or runtime, is a variant of [`Error`]. Each one
//! carries the source line it was raised on and maps to the numeric code
//! printed by the command line front-end (see [`Error::code`]).

use thiserror::Error;

/// Pati parse and runtime errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Parse errors
    /// A program line does not start with its label
    ///
    /// **Triggered by:** A statement keyword at the start of a line
    /// **Example:** `PRINT 1` (no label before `PRINT`)
    #[error("Expected line label at line {line}, found {found}")]
    ExpectedLabel {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// The token after the label does not start any statement
    ///
    /// **Example:** `start GOTO 10`
    #[error("Unrecognized statement at line {line}: {found}")]
    UnrecognizedStatement {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// A single-letter variable was required
    ///
    /// **Triggered by:** LET/INPUT targets and CALL argument names
    /// **Example:** `a LET count = 1`, `b CALL f(A = 1, )`
    #[error("Expected variable (A-Z) at line {line}, found {found}")]
    ExpectedVariable {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// Missing `=` in a LET statement or CALL argument
    #[error("Expected `=` at line {line}, found {found}")]
    ExpectedEquals {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// IF condition lacks a comparison operator
    #[error("Expected relational operator at line {line}, found {found}")]
    ExpectedRelationalOperator {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// IF condition not followed by THEN
    #[error("Expected THEN at line {line}, found {found}")]
    ExpectedThen {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// PROC or CALL not followed by a procedure name
    #[error("Expected procedure name at line {line}, found {found}")]
    ExpectedProcedureName {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
        /// True when raised by CALL, false when raised by PROC
        in_call: bool,
    },

    /// Procedure name not followed by `{`
    #[error("Expected `{{` after procedure name at line {line}, found {found}")]
    ExpectedOpenBrace {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// Input ended inside a procedure body
    #[error("Expected `}}` to close procedure {procedure}, reached end of input at line {line}")]
    ExpectedCloseBrace {
        /// Line number where error occurred
        line: usize,
        /// Procedure left open
        procedure: String,
    },

    /// A factor is neither a literal, a variable nor a parenthesized expression
    #[error("Expected number, variable or `(` at line {line}, found {found}")]
    ExpectedFactor {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// Missing `)` after a group or argument list
    #[error("Expected `)` at line {line}, found {found}")]
    ExpectedCloseParen {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// Trailing tokens after a complete statement
    ///
    /// **Example:** `a LET A = 1 2`
    #[error("Expected end of line at line {line}, found {found}")]
    ExpectedEndOfLine {
        /// Line number where error occurred
        line: usize,
        /// Description of the token found instead
        found: String,
    },

    /// Two procedures share a name
    #[error("Procedure {name} declared twice (second declaration at line {line})")]
    DuplicateProcedure {
        /// Line of the second declaration
        line: usize,
        /// Procedure name
        name: String,
    },

    /// The scanner could not classify a character sequence
    #[error("Illegal token `{text}` at line {line}, column {column}")]
    IllegalToken {
        /// Line number where error occurred
        line: usize,
        /// Column where the token starts (0-indexed)
        column: usize,
        /// Source text of the token
        text: String,
    },

    /// Parentheses, unary signs or nested IF bodies go deeper than the parser allows
    ///
    /// **Example:** `a LET A = ((((...1))))` with hundreds of open parentheses
    #[error("Nesting deeper than {limit} levels at line {line}")]
    NestingTooDeep {
        /// Line number where error occurred
        line: usize,
        /// Maximum nesting depth
        limit: usize,
    },

    // Runtime errors
    /// INPUT could not read an integer
    ///
    /// **Triggered by:** End of input, a non-numeric token or a read failure
    /// **Recovery:** Remaining targets of the statement are skipped
    #[error("Input failure at line {line} reading {variable}: {reason}")]
    InputFailure {
        /// Line number where error occurred
        line: usize,
        /// Variable that was being read
        variable: char,
        /// Why the read failed
        reason: String,
    },

    /// Division by zero
    ///
    /// **Example:** `a LET A = 10 / 0`
    /// **Recovery:** The expression evaluates to 0
    #[error("Division by zero at line {line}")]
    DivisionByZero {
        /// Line number where error occurred
        line: usize,
    },

    /// Read of a variable that was never assigned
    ///
    /// **Recovery:** The read yields 0
    #[error("Undefined variable {name} at line {line}")]
    UndefinedVariable {
        /// Line number where error occurred
        line: usize,
        /// Variable letter
        name: char,
    },

    /// Arithmetic read of a variable holding text (bound by a CALL argument)
    #[error("Type error at line {line}: variable {name} holds text, expected integer")]
    VariableTypeMismatch {
        /// Line number where error occurred
        line: usize,
        /// Variable letter
        name: char,
    },

    /// RETURN executed with no pending CALL
    #[error("RETURN without CALL at line {line}")]
    EmptyCallStack {
        /// Line number where error occurred
        line: usize,
    },

    /// CALL to a name no PROC declares
    #[error("Procedure not found: {name} at line {line}")]
    ProcedureNotFound {
        /// Line number where error occurred
        line: usize,
        /// Procedure name
        name: String,
    },

    /// CALL nesting deeper than the configured limit
    #[error("Call depth limit exceeded at line {line} (limit: {limit})")]
    CallDepthExceeded {
        /// Line number where error occurred
        line: usize,
        /// Configured maximum depth
        limit: usize,
    },

    /// Program output could not be written
    #[error("I/O error at line {line}: {message}")]
    Io {
        /// Line number where error occurred
        line: usize,
        /// Underlying error message
        message: String,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Stops parsing or execution
    Fatal,
    /// Recorded, execution continues
    Recoverable,
}

impl Error {
    /// Numeric error code as printed by the CLI (0 is reserved for "no error")
    pub fn code(&self) -> u32 {
        match self {
            Error::ExpectedLabel { .. } => 1,
            Error::UnrecognizedStatement { .. } => 2,
            Error::ExpectedVariable { .. } => 3,
            Error::ExpectedEquals { .. } => 4,
            Error::ExpectedRelationalOperator { .. } => 5,
            Error::ExpectedThen { .. } => 6,
            Error::InputFailure { .. } => 8,
            Error::DivisionByZero { .. } => 10,
            Error::UndefinedVariable { .. } => 13,
            Error::VariableTypeMismatch { .. } => 14,
            Error::EmptyCallStack { .. } => 15,
            Error::ExpectedProcedureName { in_call: false, .. } => 16,
            Error::ExpectedOpenBrace { .. } => 17,
            Error::ExpectedCloseBrace { .. } => 18,
            Error::ExpectedProcedureName { in_call: true, .. } => 19,
            Error::ProcedureNotFound { .. } => 20,
            Error::ExpectedFactor { .. } => 21,
            Error::ExpectedCloseParen { .. } => 22,
            Error::ExpectedEndOfLine { .. } => 23,
            Error::DuplicateProcedure { .. } => 24,
            Error::IllegalToken { .. } => 25,
            Error::NestingTooDeep { .. } => 28,
            Error::CallDepthExceeded { .. } => 26,
            Error::Io { .. } => 27,
        }
    }

    /// Source line the error was raised on
    pub fn line(&self) -> usize {
        match self {
            Error::ExpectedLabel { line, .. }
            | Error::UnrecognizedStatement { line, .. }
            | Error::ExpectedVariable { line, .. }
            | Error::ExpectedEquals { line, .. }
            | Error::ExpectedRelationalOperator { line, .. }
            | Error::ExpectedThen { line, .. }
            | Error::ExpectedProcedureName { line, .. }
            | Error::ExpectedOpenBrace { line, .. }
            | Error::ExpectedCloseBrace { line, .. }
            | Error::ExpectedFactor { line, .. }
            | Error::ExpectedCloseParen { line, .. }
            | Error::ExpectedEndOfLine { line, .. }
            | Error::DuplicateProcedure { line, .. }
            | Error::IllegalToken { line, .. }
            | Error::NestingTooDeep { line, .. }
            | Error::InputFailure { line, .. }
            | Error::DivisionByZero { line }
            | Error::UndefinedVariable { line, .. }
            | Error::VariableTypeMismatch { line, .. }
            | Error::EmptyCallStack { line }
            | Error::ProcedureNotFound { line, .. }
            | Error::CallDepthExceeded { line, .. }
            | Error::Io { line, .. } => *line,
        }
    }

    /// True for errors raised while building the syntax tree
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::ExpectedLabel { .. }
                | Error::UnrecognizedStatement { .. }
                | Error::ExpectedVariable { .. }
                | Error::ExpectedEquals { .. }
                | Error::ExpectedRelationalOperator { .. }
                | Error::ExpectedThen { .. }
                | Error::ExpectedProcedureName { .. }
                | Error::ExpectedOpenBrace { .. }
                | Error::ExpectedCloseBrace { .. }
                | Error::ExpectedFactor { .. }
                | Error::ExpectedCloseParen { .. }
                | Error::ExpectedEndOfLine { .. }
                | Error::DuplicateProcedure { .. }
                | Error::IllegalToken { .. }
                | Error::NestingTooDeep { .. }
        )
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::CallDepthExceeded { .. } | Error::Io { .. } => ErrorSeverity::Fatal,
            e if e.is_parse_error() => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Recoverable,
        }
    }
}

/// Result type for Pati operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_reference_numbering() {
        assert_eq!(Error::DivisionByZero { line: 1 }.code(), 10);
        assert_eq!(Error::UndefinedVariable { line: 1, name: 'A' }.code(), 13);
        assert_eq!(
            Error::ExpectedProcedureName {
                line: 1,
                found: "`{`".into(),
                in_call: false
            }
            .code(),
            16
        );
        assert_eq!(
            Error::ExpectedProcedureName {
                line: 1,
                found: "end of line".into(),
                in_call: true
            }
            .code(),
            19
        );
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            Error::DivisionByZero { line: 3 }.classify(),
            ErrorSeverity::Recoverable
        );
        assert_eq!(
            Error::CallDepthExceeded { line: 3, limit: 8 }.classify(),
            ErrorSeverity::Fatal
        );
        assert_eq!(
            Error::ExpectedThen {
                line: 3,
                found: "PRINT".into()
            }
            .classify(),
            ErrorSeverity::Fatal
        );
    }

    #[test]
    fn test_message_includes_line() {
        let err = Error::ProcedureNotFound {
            line: 7,
            name: "draw".into(),
        };
        assert_eq!(err.to_string(), "Procedure not found: draw at line 7");
        assert_eq!(err.line(), 7);
    }
}
