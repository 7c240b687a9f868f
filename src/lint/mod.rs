//! # Static checks for Pati source
//!
//! The linter works on the token stream rather than the syntax tree, so it
//! still reports useful warnings for programs that fail to parse.
//!
//! ```
//! use pati::lint::{Linter, Warning};
//!
//! let warnings = Linter::new().lint("a PRINT X\nb END\n");
//! assert_eq!(warnings, vec![Warning::UnassignedVariable { name: 'X' }]);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::lexer::{LineScanner, Token, TokenKind};
use crate::options::LanguageOptions;
use crate::parser::Variable;

/// A single linter finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// `}` with no open procedure body
    UnmatchedCloseBrace { line: usize },
    /// `{` still open at end of input
    UnmatchedOpenBrace,
    /// Variable read but never assigned anywhere
    UnassignedVariable { name: char },
    /// Variable assigned but never read
    UnusedVariable { name: char },
    /// CALL names a procedure that is not declared
    UndeclaredProcedure { name: String },
    /// Procedure declared but never called
    UncalledProcedure { name: String },
    /// `THEN` with no `IF` before it on the line
    ThenWithoutIf { line: usize },
    /// `IF` with no `THEN` after it on the line
    MissingThen { line: usize },
    /// Main program line after a top-level `END`
    UnreachableCode { line: usize },
    /// Variable bound to both strings and integers
    MixedTypes { name: char },
    /// Variable bound to a string, then read in an expression
    StringInExpression { name: char, line: usize },
    /// Arithmetic operator applied to a string literal
    StringArithmetic { line: usize },
}

impl Warning {
    /// Source line the warning points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Warning::UnmatchedCloseBrace { line }
            | Warning::ThenWithoutIf { line }
            | Warning::MissingThen { line }
            | Warning::UnreachableCode { line }
            | Warning::StringInExpression { line, .. }
            | Warning::StringArithmetic { line } => Some(*line),
            _ => None,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnmatchedCloseBrace { line } => write!(f, "Unmatched '}}' at line {}", line),
            Warning::UnmatchedOpenBrace => write!(f, "Unmatched '{{' found in the code"),
            Warning::UnassignedVariable { name } => {
                write!(f, "Variable '{}' is used but never assigned", name)
            }
            Warning::UnusedVariable { name } => {
                write!(f, "Variable '{}' is assigned but never used", name)
            }
            Warning::UndeclaredProcedure { name } => {
                write!(f, "Procedure '{}' is called but not declared", name)
            }
            Warning::UncalledProcedure { name } => {
                write!(f, "Procedure '{}' is declared but never called", name)
            }
            Warning::ThenWithoutIf { line } => {
                write!(f, "'THEN' found without a preceding 'IF' at line {}", line)
            }
            Warning::MissingThen { line } => write!(f, "Missing 'THEN' after 'IF' at line {}", line),
            Warning::UnreachableCode { line } => {
                write!(f, "Unreachable code detected at line {}", line)
            }
            Warning::MixedTypes { name } => write!(
                f,
                "Type mismatch: variable '{}' is assigned both string and integer values",
                name
            ),
            Warning::StringInExpression { name, line } => write!(
                f,
                "Type mismatch: variable '{}' holds a string but is used in an expression at line {}",
                name, line
            ),
            Warning::StringArithmetic { line } => write!(
                f,
                "Type mismatch: arithmetic on a string value at line {}",
                line
            ),
        }
    }
}

/// Token-level linter
#[derive(Debug, Clone, Default)]
pub struct Linter {
    options: LanguageOptions,
}

impl Linter {
    /// Creates a linter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a linter that scans with the given options
    pub fn with_options(options: LanguageOptions) -> Self {
        Linter { options }
    }

    /// Scans and checks source text
    pub fn lint(&self, source: &str) -> Vec<Warning> {
        let tokens = LineScanner::new(source)
            .with_comments(self.options.comments_enabled)
            .scan_tokens();
        self.lint_tokens(&tokens)
    }

    /// Checks an already scanned token stream
    pub fn lint_tokens(&self, tokens: &[Token]) -> Vec<Warning> {
        let facts = Facts::collect(tokens);
        let mut warnings = Vec::new();

        facts.check_braces(&mut warnings);
        facts.check_variables(&mut warnings);
        facts.check_procedures(&mut warnings);
        facts.check_keywords(&mut warnings);
        facts.check_reachability(&mut warnings);
        facts.check_types(&mut warnings);

        tracing::debug!(tokens = tokens.len(), warnings = warnings.len(), "lint finished");
        warnings
    }
}

/// What the next identifier on a line means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Label,
    Statement,
    ProcName,
    CallName,
    LetTarget,
    Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Int,
    Text,
}

#[derive(Debug, Default, Clone, Copy)]
struct Bindings {
    int: bool,
    text: bool,
}

/// Everything the checks need, gathered in one pass over the tokens
#[derive(Debug, Default)]
struct Facts {
    unmatched_close: Vec<usize>,
    open_braces: usize,
    assigned: BTreeSet<char>,
    used: BTreeSet<char>,
    declared: BTreeSet<String>,
    called: BTreeSet<String>,
    then_without_if: Vec<usize>,
    missing_then: Vec<usize>,
    unreachable: Option<usize>,
    bindings: BTreeMap<char, Bindings>,
    string_uses: Vec<(char, usize)>,
    string_arithmetic: Vec<usize>,
}

/// Per-line scanning state
struct LineState {
    role: Role,
    in_input: bool,
    in_call: bool,
    top_level: bool,
    pending_if: Option<usize>,
}

impl LineState {
    fn new() -> Self {
        LineState {
            role: Role::Label,
            in_input: false,
            in_call: false,
            top_level: false,
            pending_if: None,
        }
    }
}

impl Facts {
    fn collect(tokens: &[Token]) -> Self {
        let mut facts = Facts::default();
        let mut state = LineState::new();
        let mut after_end = false;

        for (i, token) in tokens.iter().enumerate() {
            let line = token.line;
            match &token.kind {
                TokenKind::Eol | TokenKind::Eof => facts.end_line(&mut state),
                TokenKind::LeftBrace => {
                    facts.open_braces += 1;
                    facts.end_line(&mut state);
                }
                TokenKind::RightBrace => {
                    if facts.open_braces == 0 {
                        facts.unmatched_close.push(line);
                    } else {
                        facts.open_braces -= 1;
                    }
                    facts.end_line(&mut state);
                }
                TokenKind::Proc => state.role = Role::ProcName,
                TokenKind::Let => state.role = Role::LetTarget,
                TokenKind::Input => {
                    state.in_input = true;
                    state.role = Role::Operand;
                }
                TokenKind::If => {
                    state.pending_if = Some(line);
                    state.role = Role::Operand;
                }
                TokenKind::Then => {
                    if state.pending_if.take().is_none() {
                        facts.then_without_if.push(line);
                    }
                    state.role = Role::Statement;
                    state.top_level = false;
                }
                TokenKind::End => {
                    if state.role == Role::Statement && state.top_level {
                        after_end = true;
                    }
                    state.role = Role::Operand;
                }
                TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash => {
                    let beside_string = [i.checked_sub(1), Some(i + 1)]
                        .into_iter()
                        .flatten()
                        .filter_map(|j| tokens.get(j))
                        .any(|t| matches!(t.kind, TokenKind::String(_)));
                    if beside_string {
                        facts.string_arithmetic.push(line);
                    }
                }
                TokenKind::Identifier(name) => match state.role {
                    Role::Label => {
                        if facts.open_braces == 0 && after_end && facts.unreachable.is_none() {
                            facts.unreachable = Some(line);
                        }
                        state.top_level = facts.open_braces == 0;
                        state.role = Role::Statement;
                    }
                    Role::Statement if name == "CALL" => state.role = Role::CallName,
                    Role::ProcName => {
                        facts.declared.insert(name.clone());
                        state.role = Role::Operand;
                    }
                    Role::CallName => {
                        facts.called.insert(name.clone());
                        state.in_call = true;
                        state.role = Role::Operand;
                    }
                    Role::LetTarget => {
                        if let Some(variable) = Variable::from_name(name) {
                            facts.assign(variable, value_kind(tokens, i));
                        }
                        state.role = Role::Operand;
                    }
                    Role::Statement | Role::Operand => {
                        let Some(variable) = Variable::from_name(name) else {
                            continue;
                        };
                        let names_argument = state.in_call
                            && matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::Equal));
                        if state.in_input {
                            facts.assign(variable, Kind::Int);
                        } else if names_argument {
                            facts.assign(variable, value_kind(tokens, i));
                        } else {
                            facts.read(variable, line);
                        }
                    }
                },
                _ => {}
            }
        }

        facts
    }

    fn end_line(&mut self, state: &mut LineState) {
        if let Some(line) = state.pending_if.take() {
            self.missing_then.push(line);
        }
        *state = LineState::new();
    }

    fn assign(&mut self, variable: Variable, kind: Kind) {
        let name = variable.letter();
        self.assigned.insert(name);
        let bindings = self.bindings.entry(name).or_default();
        match kind {
            Kind::Int => bindings.int = true,
            Kind::Text => bindings.text = true,
        }
    }

    fn read(&mut self, variable: Variable, line: usize) {
        let name = variable.letter();
        self.used.insert(name);
        let holds_text = self.bindings.get(&name).is_some_and(|b| b.text);
        if holds_text && !self.string_uses.iter().any(|(n, _)| *n == name) {
            self.string_uses.push((name, line));
        }
    }

    fn check_braces(&self, warnings: &mut Vec<Warning>) {
        for &line in &self.unmatched_close {
            warnings.push(Warning::UnmatchedCloseBrace { line });
        }
        if self.open_braces > 0 {
            warnings.push(Warning::UnmatchedOpenBrace);
        }
    }

    fn check_variables(&self, warnings: &mut Vec<Warning>) {
        for &name in self.used.difference(&self.assigned) {
            warnings.push(Warning::UnassignedVariable { name });
        }
        for &name in self.assigned.difference(&self.used) {
            warnings.push(Warning::UnusedVariable { name });
        }
    }

    fn check_procedures(&self, warnings: &mut Vec<Warning>) {
        for name in self.called.difference(&self.declared) {
            warnings.push(Warning::UndeclaredProcedure { name: name.clone() });
        }
        for name in self.declared.difference(&self.called) {
            warnings.push(Warning::UncalledProcedure { name: name.clone() });
        }
    }

    fn check_keywords(&self, warnings: &mut Vec<Warning>) {
        // Both lists are in source order; merge them so lines stay ascending
        let mut found: Vec<Warning> = self
            .then_without_if
            .iter()
            .map(|&line| Warning::ThenWithoutIf { line })
            .chain(self.missing_then.iter().map(|&line| Warning::MissingThen { line }))
            .collect();
        found.sort_by_key(|w| w.line());
        warnings.extend(found);
    }

    fn check_reachability(&self, warnings: &mut Vec<Warning>) {
        if let Some(line) = self.unreachable {
            warnings.push(Warning::UnreachableCode { line });
        }
    }

    fn check_types(&self, warnings: &mut Vec<Warning>) {
        for (&name, bindings) in &self.bindings {
            if bindings.int && bindings.text {
                warnings.push(Warning::MixedTypes { name });
            }
        }
        for &(name, line) in &self.string_uses {
            warnings.push(Warning::StringInExpression { name, line });
        }
        for &line in &self.string_arithmetic {
            warnings.push(Warning::StringArithmetic { line });
        }
    }
}

/// Kind of value bound by `<target> = <value>`, with `target` at `index`
fn value_kind(tokens: &[Token], index: usize) -> Kind {
    let equals = tokens.get(index + 1).map(|t| &t.kind);
    let value = tokens.get(index + 2).map(|t| &t.kind);
    match (equals, value) {
        (Some(TokenKind::Equal), Some(TokenKind::String(_))) => Kind::Text,
        _ => Kind::Int,
    }
}
