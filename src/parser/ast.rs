use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of variable slots (`A` through `Z`)
pub const VARIABLE_COUNT: usize = 26;

/// Frozen sequence of program lines
pub type Block = Box<[ProgramLine]>;

/// Complete Pati program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// Entry sequence, in source order
    pub main: Block,
    /// Named procedure bodies
    pub procedures: BTreeMap<String, Block>,
}

impl Program {
    /// Looks up a procedure body by name
    pub fn procedure(&self, name: &str) -> Option<&[ProgramLine]> {
        self.procedures.get(name).map(|body| &body[..])
    }

    /// Labels of the main sequence in execution order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.main.iter().map(|line| line.label.as_str())
    }
}

/// One label plus one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramLine {
    /// Line label
    pub label: String,
    /// Source line number of the label (1-indexed)
    pub line: usize,
    /// The statement on this line
    pub statement: Statement,
}

/// Variable reference, an index 0-25 standing for `A`-`Z`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Variable(u8);

impl Variable {
    /// Variable for slot `index`, if in range
    pub fn new(index: usize) -> Option<Self> {
        if index < VARIABLE_COUNT {
            Some(Variable(index as u8))
        } else {
            None
        }
    }

    /// Resolves a single upper case letter to its variable
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c @ 'A'..='Z'), None) => Some(Variable(c as u8 - b'A')),
            _ => None,
        }
    }

    /// Slot index 0-25
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Letter naming the variable
    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Assignment: LET A = expr
    Let {
        /// Target variable
        variable: Variable,
        /// Expression value to assign
        value: Expression,
    },

    /// Conditional: IF left op right THEN statement
    If {
        /// Left side of the comparison
        left: Expression,
        /// Comparison operator
        op: RelOp,
        /// Right side of the comparison
        right: Expression,
        /// Statement executed when the comparison holds
        body: Box<Statement>,
    },

    /// Output: PRINT item, item, ...
    Print {
        /// Items written separated by spaces
        items: Vec<Operand>,
    },

    /// Read integers: INPUT A, B, ...
    Input {
        /// Variables filled in order
        targets: Vec<Variable>,
    },

    /// Procedure call: CALL name(A = expr, ...)
    Call {
        /// Name of the procedure
        procedure: String,
        /// Arguments written into the variable store before the jump
        arguments: Vec<Argument>,
    },

    /// Resume after the most recent CALL
    Return,

    /// Stop the program
    End,
}

/// A PRINT item or CALL argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// String literal
    Text(String),
    /// Integer expression
    Expr(Expression),
}

/// CALL argument binding a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Variable receiving the value
    pub name: Variable,
    /// Value to store
    pub value: Operand,
}

/// Expression: term followed by additive continuations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// First term
    pub head: Term,
    /// (operator, term) pairs folded left to right
    pub rest: Vec<(AddOp, Term)>,
}

/// Term: factor followed by multiplicative continuations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// First factor
    pub head: Factor,
    /// (operator, factor) pairs folded left to right
    pub rest: Vec<(MulOp, Factor)>,
}

/// Smallest expression unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Factor {
    /// Integer literal
    Literal(i64),
    /// Variable read
    Variable(Variable),
    /// Parenthesized expression
    Group(Box<Expression>),
    /// Unary minus
    Negated(Box<Factor>),
}

/// Additive operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
}

/// Multiplicative operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MulOp {
    /// Multiplication (*)
    Mul,
    /// Truncating division (/)
    Div,
}

/// Relational operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelOp {
    /// Equal (=)
    Equal,
    /// Not equal (<>)
    NotEqual,
    /// Less than (<)
    Less,
    /// Less than or equal (<=)
    LessEqual,
    /// Greater than (>)
    Greater,
    /// Greater than or equal (>=)
    GreaterEqual,
}

impl RelOp {
    /// Applies the comparison
    pub fn holds(self, left: i64, right: i64) -> bool {
        match self {
            RelOp::Equal => left == right,
            RelOp::NotEqual => left != right,
            RelOp::Less => left < right,
            RelOp::LessEqual => left <= right,
            RelOp::Greater => left > right,
            RelOp::GreaterEqual => left >= right,
        }
    }
}

impl Expression {
    /// Expression consisting of a single factor
    pub fn factor(factor: Factor) -> Self {
        Expression {
            head: Term {
                head: factor,
                rest: Vec::new(),
            },
            rest: Vec::new(),
        }
    }

    /// Expression consisting of a single literal
    pub fn literal(value: i64) -> Self {
        Self::factor(Factor::Literal(value))
    }

    /// Expression reading a single variable
    pub fn variable(variable: Variable) -> Self {
        Self::factor(Factor::Variable(variable))
    }
}

// Rendering produces source the parser accepts and maps back to an equal tree.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.main.iter() {
            writeln!(f, "{}", line)?;
        }
        for (name, body) in &self.procedures {
            writeln!(f, "PROC {} {{", name)?;
            for line in body.iter() {
                writeln!(f, "  {}", line)?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ProgramLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.label, self.statement)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Let { variable, value } => write!(f, "LET {} = {}", variable, value),
            Statement::If {
                left,
                op,
                right,
                body,
            } => write!(f, "IF {} {} {} THEN {}", left, op, right, body),
            Statement::Print { items } => {
                write!(f, "PRINT")?;
                for (i, item) in items.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}{}", sep, item)?;
                }
                Ok(())
            }
            Statement::Input { targets } => {
                let names: Vec<String> = targets.iter().map(|v| v.to_string()).collect();
                write!(f, "INPUT {}", names.join(", "))
            }
            Statement::Call {
                procedure,
                arguments,
            } => {
                write!(f, "CALL {}", procedure)?;
                if !arguments.is_empty() {
                    let args: Vec<String> = arguments
                        .iter()
                        .map(|arg| format!("{} = {}", arg.name, arg.value))
                        .collect();
                    write!(f, "({})", args.join(", "))?;
                }
                Ok(())
            }
            Statement::Return => write!(f, "RETURN"),
            Statement::End => write!(f, "END"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Text(text) => write!(f, "\"{}\"", text),
            Operand::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.head)?;
        for (op, term) in &self.rest {
            write!(f, " {} {}", op, term)?;
        }
        Ok(())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.head)?;
        for (op, factor) in &self.rest {
            write!(f, " {} {}", op, factor)?;
        }
        Ok(())
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Factor::Literal(n) if *n < 0 => write!(f, "({})", n),
            Factor::Literal(n) => write!(f, "{}", n),
            Factor::Variable(v) => write!(f, "{}", v),
            Factor::Group(expr) => write!(f, "({})", expr),
            Factor::Negated(inner) => write!(f, "-{}", inner),
        }
    }
}

impl fmt::Display for AddOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AddOp::Add => write!(f, "+"),
            AddOp::Sub => write!(f, "-"),
        }
    }
}

impl fmt::Display for MulOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MulOp::Mul => write!(f, "*"),
            MulOp::Div => write!(f, "/"),
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            RelOp::Equal => "=",
            RelOp::NotEqual => "<>",
            RelOp::Less => "<",
            RelOp::LessEqual => "<=",
            RelOp::Greater => ">",
            RelOp::GreaterEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_from_name() {
        assert_eq!(Variable::from_name("A").map(Variable::index), Some(0));
        assert_eq!(Variable::from_name("Z").map(Variable::index), Some(25));
        assert_eq!(Variable::from_name("a"), None);
        assert_eq!(Variable::from_name("AB"), None);
        assert_eq!(Variable::from_name(""), None);
        assert_eq!(Variable::new(26), None);
    }

    #[test]
    fn test_relop_holds() {
        assert!(RelOp::Equal.holds(5, 5));
        assert!(RelOp::NotEqual.holds(4, 5));
        assert!(RelOp::LessEqual.holds(5, 5));
        assert!(!RelOp::Greater.holds(5, 5));
        assert!(RelOp::GreaterEqual.holds(-1, -2));
    }

    #[test]
    fn test_display_statement() {
        let a = Variable::from_name("A").unwrap();
        let stmt = Statement::If {
            left: Expression::variable(a),
            op: RelOp::NotEqual,
            right: Expression::factor(Factor::Negated(Box::new(Factor::Literal(3)))),
            body: Box::new(Statement::Print {
                items: vec![Operand::Text("no".into()), Operand::Expr(Expression::variable(a))],
            }),
        };
        assert_eq!(stmt.to_string(), "IF A <> -3 THEN PRINT \"no\", A");
    }

    #[test]
    fn test_display_call() {
        let stmt = Statement::Call {
            procedure: "show".into(),
            arguments: vec![Argument {
                name: Variable::from_name("N").unwrap(),
                value: Operand::Expr(Expression::literal(4)),
            }],
        };
        assert_eq!(stmt.to_string(), "CALL show(N = 4)");
        let bare = Statement::Call {
            procedure: "show".into(),
            arguments: vec![],
        };
        assert_eq!(bare.to_string(), "CALL show");
    }
}
