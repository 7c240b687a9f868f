use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::{Error, Result};
use crate::options::LanguageOptions;
use crate::parser::{
    AddOp, Expression, Factor, MulOp, Operand, Program, ProgramLine, Statement, Term, Variable,
};
use crate::runtime::{Diagnostics, Value, Variables};

/// Tree-walking interpreter for Pati programs
///
/// Executes one program line at a time starting at the head of the main
/// sequence:
/// - `CALL` pushes a return point and jumps to the procedure body
/// - `RETURN` (or running off the end of a procedure) resumes after the call
/// - `END` or running off the end of the main sequence stops the run
///
/// Every run yields a [`RunReport`]. Recoverable faults are collected in its
/// diagnostics; a fatal fault stops the run and is stored in `fatal`
/// alongside the faults recorded before it.
pub struct Interpreter<R, W> {
    /// Source of INPUT values
    input: R,
    /// Destination of PRINT output and INPUT prompts
    output: W,
    options: LanguageOptions,
    /// Words read from `input` but not yet consumed
    pending_input: VecDeque<String>,
}

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Recoverable faults raised during the run
    pub diagnostics: Diagnostics,
    /// Fault that stopped the run early, if any
    pub fatal: Option<Error>,
    /// Depth of the call stack when the run stopped
    pub call_depth: usize,
    /// Number of program lines executed
    pub lines_executed: usize,
}

impl RunReport {
    /// True when nothing, recoverable or fatal, was raised
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_clean() && self.fatal.is_none()
    }

    /// All faults in the order they were raised, the fatal one last
    pub fn faults(&self) -> impl Iterator<Item = &Error> {
        self.diagnostics.iter().chain(self.fatal.iter())
    }
}

/// Position within a frozen line sequence
#[derive(Debug, Clone, Copy)]
struct Cursor<'p> {
    lines: &'p [ProgramLine],
    index: usize,
}

impl<'p> Cursor<'p> {
    fn start(lines: &'p [ProgramLine]) -> Option<Self> {
        if lines.is_empty() {
            None
        } else {
            Some(Cursor { lines, index: 0 })
        }
    }

    fn line(&self) -> &'p ProgramLine {
        &self.lines[self.index]
    }

    fn next(self) -> Option<Self> {
        let index = self.index + 1;
        if index < self.lines.len() {
            Some(Cursor { index, ..self })
        } else {
            None
        }
    }
}

/// Control transfer requested by a statement
enum Flow<'p> {
    Next,
    Call {
        procedure: &'p str,
        body: &'p [ProgramLine],
    },
    Return,
    Halt,
}

/// Fault sink for a single statement
///
/// After a division by zero the rest of the statement still runs, with the
/// failed expression read as 0, but raises no further faults.
struct StatementFaults<'d> {
    diagnostics: &'d mut Diagnostics,
    silenced: bool,
}

impl<'d> StatementFaults<'d> {
    fn new(diagnostics: &'d mut Diagnostics) -> Self {
        StatementFaults {
            diagnostics,
            silenced: false,
        }
    }

    fn report(&mut self, fault: Error) {
        if self.silenced {
            tracing::trace!(code = fault.code(), line = fault.line(), "fault suppressed");
            return;
        }
        self.silenced = matches!(fault, Error::DivisionByZero { .. });
        self.diagnostics.report(fault);
    }
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    /// Creates an interpreter with default options
    pub fn new(input: R, output: W) -> Self {
        Self::with_options(input, output, LanguageOptions::default())
    }

    /// Creates an interpreter with the given options
    pub fn with_options(input: R, output: W, options: LanguageOptions) -> Self {
        Interpreter {
            input,
            output,
            options,
            pending_input: VecDeque::new(),
        }
    }

    /// Options in effect
    pub fn options(&self) -> &LanguageOptions {
        &self.options
    }

    /// Output written so far
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Consumes the interpreter, returning its output sink
    pub fn into_output(self) -> W {
        self.output
    }

    /// Executes a program with a fresh variable store
    pub fn execute(&mut self, program: &Program) -> RunReport {
        let mut vars = Variables::new();
        self.run(program, &mut vars)
    }

    /// Executes a program against the given variable store
    pub fn run(&mut self, program: &Program, vars: &mut Variables) -> RunReport {
        let mut report = RunReport::default();

        tracing::debug!(
            lines = program.main.len(),
            procedures = program.procedures.len(),
            "starting run"
        );

        if let Err(fatal) = self.drive(program, vars, &mut report) {
            tracing::warn!(code = fatal.code(), line = fatal.line(), "run aborted: {}", fatal);
            report.fatal = Some(fatal);
        }

        tracing::info!(
            lines_executed = report.lines_executed,
            faults = report.diagnostics.len(),
            "run finished"
        );
        report
    }

    /// Steps through the program until it halts or a fatal fault occurs
    fn drive(
        &mut self,
        program: &Program,
        vars: &mut Variables,
        report: &mut RunReport,
    ) -> Result<()> {
        let mut stack: Vec<Cursor<'_>> = Vec::new();
        let mut cursor = Cursor::start(&program.main);

        while let Some(at) = cursor {
            let line = at.line();
            report.lines_executed += 1;
            tracing::trace!(label = %line.label, line = line.line, "executing");

            let mut faults = StatementFaults::new(&mut report.diagnostics);
            let flow =
                self.execute_statement(&line.statement, line.line, program, vars, &mut faults)?;

            cursor = match flow {
                Flow::Next => resume(&mut stack, at.next()),
                Flow::Call { procedure, body } => {
                    if stack.len() >= self.options.call_depth_limit {
                        return Err(Error::CallDepthExceeded {
                            line: line.line,
                            limit: self.options.call_depth_limit,
                        });
                    }
                    tracing::debug!(procedure, depth = stack.len() + 1, "call");
                    stack.push(at);
                    resume(&mut stack, Cursor::start(body))
                }
                Flow::Return => match stack.pop() {
                    Some(caller) => {
                        tracing::debug!(depth = stack.len(), "return");
                        resume(&mut stack, caller.next())
                    }
                    None => {
                        faults.report(Error::EmptyCallStack { line: line.line });
                        resume(&mut stack, at.next())
                    }
                },
                Flow::Halt => None,
            };
            report.call_depth = stack.len();
        }

        Ok(())
    }

    fn execute_statement<'p>(
        &mut self,
        statement: &'p Statement,
        line: usize,
        program: &'p Program,
        vars: &mut Variables,
        faults: &mut StatementFaults<'_>,
    ) -> Result<Flow<'p>> {
        match statement {
            Statement::Let { variable, value } => {
                let value = evaluate_in(value, vars, faults, line);
                vars.set(*variable, value);
                Ok(Flow::Next)
            }

            Statement::If {
                left,
                op,
                right,
                body,
            } => {
                let left = evaluate_in(left, vars, faults, line);
                let right = evaluate_in(right, vars, faults, line);
                if op.holds(left, right) {
                    self.execute_statement(body, line, program, vars, faults)
                } else {
                    Ok(Flow::Next)
                }
            }

            Statement::Print { items } => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Operand::Text(text) => text.clone(),
                        Operand::Expr(expr) => evaluate_in(expr, vars, faults, line).to_string(),
                    })
                    .collect();
                writeln!(self.output, "{}", parts.join(" ")).map_err(|e| io_error(line, e))?;
                Ok(Flow::Next)
            }

            Statement::Input { targets } => {
                self.read_inputs(targets, line, vars, faults)?;
                Ok(Flow::Next)
            }

            Statement::Call {
                procedure,
                arguments,
            } => {
                let Some(body) = program.procedure(procedure) else {
                    faults.report(Error::ProcedureNotFound {
                        line,
                        name: procedure.clone(),
                    });
                    return Ok(Flow::Next);
                };

                for argument in arguments {
                    let value = match &argument.value {
                        Operand::Text(text) => Value::Text(text.clone()),
                        Operand::Expr(expr) => Value::Int(evaluate_in(expr, vars, faults, line)),
                    };
                    vars.set(argument.name, value);
                }

                Ok(Flow::Call {
                    procedure: procedure.as_str(),
                    body,
                })
            }

            Statement::Return => Ok(Flow::Return),

            Statement::End => Ok(Flow::Halt),
        }
    }

    /// Reads one integer per target; the first failure skips the rest
    fn read_inputs(
        &mut self,
        targets: &[Variable],
        line: usize,
        vars: &mut Variables,
        faults: &mut StatementFaults<'_>,
    ) -> Result<()> {
        for &target in targets {
            if self.options.input_prompts {
                write!(self.output, "Enter value for variable {}: ", target.letter())
                    .and_then(|_| self.output.flush())
                    .map_err(|e| io_error(line, e))?;
            }

            let reason = match self.next_input_word() {
                Ok(Some(word)) => match word.parse::<i64>() {
                    Ok(n) => {
                        vars.set(target, n);
                        continue;
                    }
                    Err(_) => format!("`{}` is not an integer", word),
                },
                Ok(None) => "end of input".to_string(),
                Err(e) => e.to_string(),
            };

            faults.report(Error::InputFailure {
                line,
                variable: target.letter(),
                reason,
            });
            break;
        }
        Ok(())
    }

    fn next_input_word(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(word) = self.pending_input.pop_front() {
                return Ok(Some(word));
            }
            let mut buffer = String::new();
            if self.input.read_line(&mut buffer)? == 0 {
                return Ok(None);
            }
            self.pending_input
                .extend(buffer.split_whitespace().map(str::to_string));
        }
    }
}

/// Continues at `next`, or returns to callers whose bodies have run out
fn resume<'p>(stack: &mut Vec<Cursor<'p>>, mut next: Option<Cursor<'p>>) -> Option<Cursor<'p>> {
    while next.is_none() {
        let caller = stack.pop()?;
        tracing::debug!(depth = stack.len(), "implicit return at end of procedure");
        next = caller.next();
    }
    next
}

fn io_error(line: usize, error: io::Error) -> Error {
    Error::Io {
        line,
        message: error.to_string(),
    }
}

/// Evaluates an integer expression on its own
///
/// Reads of unset or text-valued variables are recorded and read as 0.
/// Division by zero is recorded once and makes the whole expression 0.
pub fn evaluate(
    expr: &Expression,
    vars: &Variables,
    diagnostics: &mut Diagnostics,
    line: usize,
) -> i64 {
    evaluate_in(expr, vars, &mut StatementFaults::new(diagnostics), line)
}

fn evaluate_in(
    expr: &Expression,
    vars: &Variables,
    faults: &mut StatementFaults<'_>,
    line: usize,
) -> i64 {
    let mut eval = ExprEval { vars, faults, line };
    match eval.expression(expr) {
        Ok(value) => value,
        Err(fault) => {
            eval.faults.report(fault);
            0
        }
    }
}

struct ExprEval<'a, 'd> {
    vars: &'a Variables,
    faults: &'a mut StatementFaults<'d>,
    line: usize,
}

impl ExprEval<'_, '_> {
    fn expression(&mut self, expr: &Expression) -> Result<i64> {
        let mut value = self.term(&expr.head)?;
        for (op, term) in &expr.rest {
            let rhs = self.term(term)?;
            value = match op {
                AddOp::Add => value.wrapping_add(rhs),
                AddOp::Sub => value.wrapping_sub(rhs),
            };
        }
        Ok(value)
    }

    fn term(&mut self, term: &Term) -> Result<i64> {
        let mut value = self.factor(&term.head)?;
        for (op, factor) in &term.rest {
            let rhs = self.factor(factor)?;
            value = match op {
                MulOp::Mul => value.wrapping_mul(rhs),
                MulOp::Div => {
                    if rhs == 0 {
                        return Err(Error::DivisionByZero { line: self.line });
                    }
                    value.wrapping_div(rhs)
                }
            };
        }
        Ok(value)
    }

    fn factor(&mut self, factor: &Factor) -> Result<i64> {
        match factor {
            Factor::Literal(n) => Ok(*n),
            Factor::Variable(variable) => Ok(self.read(*variable)),
            Factor::Group(inner) => self.expression(inner),
            Factor::Negated(inner) => Ok(self.factor(inner)?.wrapping_neg()),
        }
    }

    fn read(&mut self, variable: Variable) -> i64 {
        match self.vars.get(variable) {
            Some(Value::Int(n)) => *n,
            Some(Value::Text(_)) => {
                self.faults.report(Error::VariableTypeMismatch {
                    line: self.line,
                    name: variable.letter(),
                });
                0
            }
            None => {
                self.faults.report(Error::UndefinedVariable {
                    line: self.line,
                    name: variable.letter(),
                });
                0
            }
        }
    }
}
