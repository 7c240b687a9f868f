use std::collections::BTreeMap;

use super::ast::{
    AddOp, Argument, Block, Expression, Factor, MulOp, Operand, Program, ProgramLine, RelOp,
    Statement, Term, Variable,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Deepest nesting of groups, unary signs and IF bodies the parser accepts
pub const MAX_NESTING_DEPTH: usize = 128;

/// Recursive descent parser for line-oriented Pati programs
///
/// Parsing stops at the first structural error; no recovery is attempted.
pub struct ProgramParser {
    tokens: Vec<Token>,
    current: usize,
    /// Current nesting of groups, signs and IF bodies
    depth: usize,
}

impl ProgramParser {
    /// Creates a new parser over a scanned token stream
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, 0));
        }
        ProgramParser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parses the tokens into a program tree
    pub fn parse(&mut self) -> Result<Program> {
        let mut main = Vec::new();
        let mut procedures = BTreeMap::new();

        self.skip_line_breaks();
        while !self.is_at_end() {
            if self.check(&TokenKind::Proc) {
                let (name, line, body) = self.parse_procedure()?;
                if procedures.contains_key(&name) {
                    return Err(Error::DuplicateProcedure { line, name });
                }
                tracing::debug!(procedure = %name, lines = body.len(), "registered procedure");
                procedures.insert(name, body);
            } else {
                main.push(self.parse_program_line()?);
            }
            self.skip_line_breaks();
        }

        Ok(Program {
            main: main.into_boxed_slice(),
            procedures,
        })
    }

    /// Parse `PROC name { lines }`
    fn parse_procedure(&mut self) -> Result<(String, usize, Block)> {
        self.advance(); // consume PROC

        let name_token = self.peek().clone();
        let name = match &name_token.kind {
            TokenKind::Identifier(name) => name.clone(),
            _ => {
                return Err(self.unexpected(|line, found| Error::ExpectedProcedureName {
                    line,
                    found,
                    in_call: false,
                }))
            }
        };
        self.advance();

        if !self.check(&TokenKind::LeftBrace) {
            return Err(self.unexpected(|line, found| Error::ExpectedOpenBrace { line, found }));
        }
        self.advance();

        let mut lines = Vec::new();
        self.skip_line_breaks();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(Error::ExpectedCloseBrace {
                    line: self.peek().line,
                    procedure: name,
                });
            }
            lines.push(self.parse_program_line()?);
            self.skip_line_breaks();
        }
        self.advance(); // consume }

        Ok((name, name_token.line, lines.into_boxed_slice()))
    }

    /// Parse `label statement` followed by a line terminator
    fn parse_program_line(&mut self) -> Result<ProgramLine> {
        let token = self.peek().clone();
        let label = match token.kind {
            TokenKind::Identifier(name) => name,
            _ => return Err(self.unexpected(|line, found| Error::ExpectedLabel { line, found })),
        };
        self.advance();

        let statement = self.parse_statement()?;
        self.expect_line_end()?;

        Ok(ProgramLine {
            label,
            line: token.line,
            statement,
        })
    }

    /// Dispatch on the leading token of a statement
    fn parse_statement(&mut self) -> Result<Statement> {
        match &self.peek().kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Input => self.parse_input(),
            TokenKind::Identifier(name) if name == "CALL" => self.parse_call(),
            TokenKind::Return => {
                self.advance();
                Ok(Statement::Return)
            }
            TokenKind::End => {
                self.advance();
                Ok(Statement::End)
            }
            _ => Err(self.unexpected(|line, found| Error::UnrecognizedStatement { line, found })),
        }
    }

    /// Parse `LET var = expr`
    fn parse_let(&mut self) -> Result<Statement> {
        self.advance(); // consume LET

        let variable = self.expect_variable()?;
        self.expect_equals()?;
        let value = self.parse_expression()?;

        Ok(Statement::Let { variable, value })
    }

    /// Parse `IF expr relop expr THEN statement`
    fn parse_if(&mut self) -> Result<Statement> {
        self.advance(); // consume IF

        let left = self.parse_expression()?;

        let op = match self.peek().kind {
            TokenKind::Equal => RelOp::Equal,
            TokenKind::NotEqual => RelOp::NotEqual,
            TokenKind::Less => RelOp::Less,
            TokenKind::LessEqual => RelOp::LessEqual,
            TokenKind::Greater => RelOp::Greater,
            TokenKind::GreaterEqual => RelOp::GreaterEqual,
            _ => {
                return Err(self.unexpected(|line, found| Error::ExpectedRelationalOperator {
                    line,
                    found,
                }))
            }
        };
        self.advance();

        let right = self.parse_expression()?;

        if !self.check(&TokenKind::Then) {
            return Err(self.unexpected(|line, found| Error::ExpectedThen { line, found }));
        }
        self.advance();

        let body = Box::new(self.nested(Self::parse_statement)?);

        Ok(Statement::If {
            left,
            op,
            right,
            body,
        })
    }

    /// Parse `PRINT [operand {, operand}]`
    fn parse_print(&mut self) -> Result<Statement> {
        self.advance(); // consume PRINT

        let mut items = Vec::new();
        if !self.at_line_end() {
            items.push(self.parse_operand()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                items.push(self.parse_operand()?);
            }
        }

        Ok(Statement::Print { items })
    }

    /// Parse `INPUT var {, var}`
    fn parse_input(&mut self) -> Result<Statement> {
        self.advance(); // consume INPUT

        let mut targets = vec![self.expect_variable()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            targets.push(self.expect_variable()?);
        }

        Ok(Statement::Input { targets })
    }

    /// Parse `CALL name [( var = operand {, var = operand} )]`
    fn parse_call(&mut self) -> Result<Statement> {
        self.advance(); // consume CALL

        let procedure = match &self.peek().kind {
            TokenKind::Identifier(name) => name.clone(),
            _ => {
                return Err(self.unexpected(|line, found| Error::ExpectedProcedureName {
                    line,
                    found,
                    in_call: true,
                }))
            }
        };
        self.advance();

        let mut arguments = Vec::new();
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            if !self.check(&TokenKind::RightParen) {
                arguments.push(self.parse_argument()?);
                // A comma must be followed by another argument, so `(A = 1,)` is rejected
                while self.check(&TokenKind::Comma) {
                    self.advance();
                    arguments.push(self.parse_argument()?);
                }
            }
            self.expect_close_paren()?;
        }

        Ok(Statement::Call {
            procedure,
            arguments,
        })
    }

    fn parse_argument(&mut self) -> Result<Argument> {
        let name = self.expect_variable()?;
        self.expect_equals()?;
        let value = self.parse_operand()?;
        Ok(Argument { name, value })
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        if let TokenKind::String(text) = &self.peek().kind {
            let text = text.clone();
            self.advance();
            return Ok(Operand::Text(text));
        }
        Ok(Operand::Expr(self.parse_expression()?))
    }

    /// Parse `term {(+|-) term}`
    fn parse_expression(&mut self) -> Result<Expression> {
        let head = self.parse_term()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => AddOp::Add,
                TokenKind::Minus => AddOp::Sub,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_term()?));
        }

        Ok(Expression { head, rest })
    }

    /// Parse `factor {(*|/) factor}`
    fn parse_term(&mut self) -> Result<Term> {
        let head = self.parse_factor()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.peek().kind {
                TokenKind::Star => MulOp::Mul,
                TokenKind::Slash => MulOp::Div,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_factor()?));
        }

        Ok(Term { head, rest })
    }

    /// Parse a literal, variable, signed factor or parenthesized expression
    fn parse_factor(&mut self) -> Result<Factor> {
        match &self.peek().kind {
            TokenKind::Integer(n) => {
                let n = *n;
                self.advance();
                Ok(Factor::Literal(n))
            }
            TokenKind::Identifier(name) => match Variable::from_name(name) {
                Some(variable) => {
                    self.advance();
                    Ok(Factor::Variable(variable))
                }
                None => Err(self.unexpected(|line, found| Error::ExpectedFactor { line, found })),
            },
            TokenKind::Minus => {
                self.advance();
                Ok(Factor::Negated(Box::new(self.nested(Self::parse_factor)?)))
            }
            TokenKind::Plus => {
                self.advance();
                self.nested(Self::parse_factor)
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.nested(Self::parse_expression)?;
                self.expect_close_paren()?;
                Ok(Factor::Group(Box::new(inner)))
            }
            _ => Err(self.unexpected(|line, found| Error::ExpectedFactor { line, found })),
        }
    }

    /// Runs `parse` one nesting level deeper, failing past `MAX_NESTING_DEPTH`
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                line: self.peek().line,
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect_variable(&mut self) -> Result<Variable> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            if let Some(variable) = Variable::from_name(name) {
                self.advance();
                return Ok(variable);
            }
        }
        Err(self.unexpected(|line, found| Error::ExpectedVariable { line, found }))
    }

    fn expect_equals(&mut self) -> Result<()> {
        if !self.check(&TokenKind::Equal) {
            return Err(self.unexpected(|line, found| Error::ExpectedEquals { line, found }));
        }
        self.advance();
        Ok(())
    }

    fn expect_close_paren(&mut self) -> Result<()> {
        if !self.check(&TokenKind::RightParen) {
            return Err(self.unexpected(|line, found| Error::ExpectedCloseParen { line, found }));
        }
        self.advance();
        Ok(())
    }

    /// A statement ends at a line break, the end of input, or a closing brace
    fn expect_line_end(&mut self) -> Result<()> {
        if self.at_line_end() {
            if self.check(&TokenKind::Eol) {
                self.advance();
            }
            Ok(())
        } else {
            Err(self.unexpected(|line, found| Error::ExpectedEndOfLine { line, found }))
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Eol | TokenKind::Eof | TokenKind::RightBrace
        )
    }

    fn skip_line_breaks(&mut self) {
        while self.check(&TokenKind::Eol) {
            self.advance();
        }
    }

    /// Builds the error for the current token, preferring `IllegalToken`
    /// when the scanner could not classify it
    fn unexpected(&self, build: impl FnOnce(usize, String) -> Error) -> Error {
        let token = self.peek();
        if token.kind == TokenKind::Illegal {
            return Error::IllegalToken {
                line: token.line,
                column: token.column,
                text: token.lexeme.clone(),
            };
        }
        build(token.line, token.describe())
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LineScanner;

    fn parse(source: &str) -> Result<Program> {
        let tokens = LineScanner::new(source).scan_tokens();
        ProgramParser::new(tokens).parse()
    }

    fn var(name: &str) -> Variable {
        Variable::from_name(name).unwrap()
    }

    #[test]
    fn test_let_statement() {
        let program = parse("start LET A = 5").unwrap();

        assert_eq!(program.main.len(), 1);
        assert_eq!(program.main[0].label, "start");
        assert_eq!(
            program.main[0].statement,
            Statement::Let {
                variable: var("A"),
                value: Expression::literal(5),
            }
        );
    }

    #[test]
    fn test_precedence_two_levels() {
        let program = parse("a LET A = 1 + B * 3 - 4").unwrap();
        let Statement::Let { value, .. } = &program.main[0].statement else {
            panic!("expected LET");
        };

        assert_eq!(value.head, Term { head: Factor::Literal(1), rest: vec![] });
        assert_eq!(value.rest.len(), 2);
        assert_eq!(value.rest[0].0, AddOp::Add);
        assert_eq!(
            value.rest[0].1,
            Term {
                head: Factor::Variable(var("B")),
                rest: vec![(MulOp::Mul, Factor::Literal(3))],
            }
        );
        assert_eq!(value.rest[1].0, AddOp::Sub);
    }

    #[test]
    fn test_parenthesized_and_negated() {
        let program = parse("a LET A = -(B + 1)").unwrap();
        let Statement::Let { value, .. } = &program.main[0].statement else {
            panic!("expected LET");
        };
        let Factor::Negated(inner) = &value.head.head else {
            panic!("expected negation");
        };
        assert!(matches!(**inner, Factor::Group(_)));
    }

    #[test]
    fn test_if_with_nested_statement() {
        let program = parse("t IF A <= 10 THEN IF B <> 0 THEN PRINT A").unwrap();
        let Statement::If { op, body, .. } = &program.main[0].statement else {
            panic!("expected IF");
        };
        assert_eq!(*op, RelOp::LessEqual);
        assert!(matches!(**body, Statement::If { op: RelOp::NotEqual, .. }));
    }

    #[test]
    fn test_procedures_and_main_order() {
        let source = "\
one LET A = 1
PROC show {
  s1 PRINT A
  s2 RETURN
}
two CALL show
three END
";
        let program = parse(source).unwrap();
        assert_eq!(program.labels().collect::<Vec<_>>(), vec!["one", "two", "three"]);
        let body = program.procedure("show").unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[1].statement, Statement::Return);
        assert_eq!(body[0].line, 3);
    }

    #[test]
    fn test_closing_brace_on_statement_line() {
        let program = parse("PROC p { a RETURN }\nm CALL p").unwrap();
        assert_eq!(program.procedure("p").unwrap().len(), 1);
        assert_eq!(program.main.len(), 1);
    }

    #[test]
    fn test_call_arguments() {
        let program = parse("c CALL draw(A = 2 * B, N = \"bob\")").unwrap();
        let Statement::Call { procedure, arguments } = &program.main[0].statement else {
            panic!("expected CALL");
        };
        assert_eq!(procedure, "draw");
        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments[1].name, var("N"));
        assert_eq!(arguments[1].value, Operand::Text("bob".into()));
    }

    #[test]
    fn test_print_and_input_lists() {
        let program = parse("p PRINT \"sum\", A + B\nq INPUT A, B, C\nr PRINT").unwrap();
        assert!(matches!(&program.main[0].statement, Statement::Print { items } if items.len() == 2));
        assert!(matches!(&program.main[1].statement, Statement::Input { targets } if targets.len() == 3));
        assert!(matches!(&program.main[2].statement, Statement::Print { items } if items.is_empty()));
    }

    #[test]
    fn test_missing_label() {
        let err = parse("LET A = 1").unwrap_err();
        assert!(matches!(err, Error::ExpectedLabel { line: 1, .. }));
    }

    #[test]
    fn test_unrecognized_statement() {
        let err = parse("a GOTO 10").unwrap_err();
        assert!(matches!(err, Error::UnrecognizedStatement { .. }));
        assert_eq!(err.code(), 2);
    }

    #[test]
    fn test_let_errors() {
        assert!(matches!(
            parse("a LET count = 1").unwrap_err(),
            Error::ExpectedVariable { .. }
        ));
        assert!(matches!(
            parse("a LET A 1").unwrap_err(),
            Error::ExpectedEquals { .. }
        ));
    }

    #[test]
    fn test_if_errors() {
        assert!(matches!(
            parse("a IF A THEN END").unwrap_err(),
            Error::ExpectedRelationalOperator { .. }
        ));
        assert!(matches!(
            parse("a IF A = 1 PRINT A").unwrap_err(),
            Error::ExpectedThen { .. }
        ));
    }

    #[test]
    fn test_procedure_errors() {
        let err = parse("PROC {").unwrap_err();
        assert_eq!(err.code(), 16);
        let err = parse("PROC p\na END").unwrap_err();
        assert!(matches!(err, Error::ExpectedOpenBrace { .. }));
        let err = parse("PROC p {\n a RETURN\n").unwrap_err();
        assert!(matches!(err, Error::ExpectedCloseBrace { ref procedure, .. } if procedure == "p"));
        let err = parse("PROC p { a RETURN }\nPROC p { b RETURN }").unwrap_err();
        assert!(matches!(err, Error::DuplicateProcedure { line: 2, .. }));
    }

    #[test]
    fn test_call_errors() {
        let err = parse("a CALL 5").unwrap_err();
        assert_eq!(err.code(), 19);
        let err = parse("a CALL f(A = 1,)").unwrap_err();
        assert!(matches!(err, Error::ExpectedVariable { .. }));
        let err = parse("a CALL f(A = 1").unwrap_err();
        assert!(matches!(err, Error::ExpectedCloseParen { .. }));
    }

    #[test]
    fn test_expression_errors() {
        assert!(matches!(
            parse("a LET A = * 2").unwrap_err(),
            Error::ExpectedFactor { .. }
        ));
        assert!(matches!(
            parse("a LET A = (1 + 2").unwrap_err(),
            Error::ExpectedCloseParen { .. }
        ));
        assert!(matches!(
            parse("a LET A = 1 2").unwrap_err(),
            Error::ExpectedEndOfLine { .. }
        ));
    }

    #[test]
    fn test_illegal_token_reported() {
        let err = parse("a LET A = 1 % 2").unwrap_err();
        assert_eq!(
            err,
            Error::IllegalToken {
                line: 1,
                column: 12,
                text: "%".into()
            }
        );
    }

    #[test]
    fn test_error_line_numbers() {
        let err = parse("a LET A = 1\n\nb LET B = \nc END").unwrap_err();
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_nesting_limit() {
        let at_limit = format!(
            "a LET A = {}1{}",
            "(".repeat(MAX_NESTING_DEPTH),
            ")".repeat(MAX_NESTING_DEPTH)
        );
        assert!(parse(&at_limit).is_ok());

        let too_deep = format!("a PRINT 1\nb LET A = {}1", "(".repeat(50_000));
        let err = parse(&too_deep).unwrap_err();
        assert_eq!(
            err,
            Error::NestingTooDeep {
                line: 2,
                limit: MAX_NESTING_DEPTH
            }
        );
        assert_eq!(err.code(), 28);

        let signs = format!("a LET A = {}1", "-+".repeat(MAX_NESTING_DEPTH));
        assert!(matches!(
            parse(&signs).unwrap_err(),
            Error::NestingTooDeep { line: 1, .. }
        ));
    }

    #[test]
    fn test_nested_if_limit() {
        let chain = |n: usize| format!("a {}END", "IF 1 = 1 THEN ".repeat(n));
        assert!(parse(&chain(MAX_NESTING_DEPTH)).is_ok());
        assert!(matches!(
            parse(&chain(MAX_NESTING_DEPTH + 1)).unwrap_err(),
            Error::NestingTooDeep { .. }
        ));
    }

    #[test]
    fn test_empty_program() {
        let program = parse("\n\n").unwrap();
        assert!(program.main.is_empty());
        assert!(program.procedures.is_empty());
    }
}
