use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (0-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    /// Human readable description used in diagnostics
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Eol => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::String(_) => format!("string {}", self.lexeme),
            TokenKind::Integer(_) => format!("number {}", self.lexeme),
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            _ => format!("`{}`", self.lexeme),
        }
    }
}

/// All possible token types in Pati
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Integer(i64),
    /// String literal (without quotes)
    String(String),

    // Identifiers
    /// Identifier: labels, procedure names, variables and `CALL`
    Identifier(String),

    // Keywords
    /// LET keyword
    Let,
    /// IF keyword
    If,
    /// THEN keyword
    Then,
    /// PRINT keyword
    Print,
    /// INPUT keyword
    Input,
    /// RETURN keyword
    Return,
    /// END keyword
    End,
    /// PROC keyword (procedure declaration)
    Proc,

    // Operators
    /// Plus operator (+)
    Plus,
    /// Minus operator (-)
    Minus,
    /// Star operator (*)
    Star,
    /// Slash operator (/)
    Slash,
    /// Equals sign (=), both assignment and comparison
    Equal,
    /// Inequality operator (<>)
    NotEqual,
    /// Less than operator (<)
    Less,
    /// Less than or equal operator (<=)
    LessEqual,
    /// Greater than operator (>)
    Greater,
    /// Greater than or equal operator (>=)
    GreaterEqual,
    /// Comma delimiter
    Comma,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,

    // Special
    /// End of a source line
    Eol,
    /// End of file marker
    Eof,
    /// Character sequence the scanner could not classify
    Illegal,
}

impl TokenKind {
    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::If
                | TokenKind::Then
                | TokenKind::Print
                | TokenKind::Input
                | TokenKind::Return
                | TokenKind::End
                | TokenKind::Proc
        )
    }

    /// Get keyword from string. Keywords are upper case only.
    pub fn keyword(s: &str) -> Option<TokenKind> {
        match s {
            "LET" => Some(TokenKind::Let),
            "IF" => Some(TokenKind::If),
            "THEN" => Some(TokenKind::Then),
            "PRINT" => Some(TokenKind::Print),
            "INPUT" => Some(TokenKind::Input),
            "RETURN" => Some(TokenKind::Return),
            "END" => Some(TokenKind::End),
            "PROC" => Some(TokenKind::Proc),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(id) => write!(f, "{}", id),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_detection() {
        assert_eq!(TokenKind::keyword("LET"), Some(TokenKind::Let));
        assert_eq!(TokenKind::keyword("PROC"), Some(TokenKind::Proc));
        // CALL is resolved by the parser, not the scanner
        assert_eq!(TokenKind::keyword("CALL"), None);
        assert_eq!(TokenKind::keyword("let"), None);
    }

    #[test]
    fn test_is_keyword() {
        assert!(TokenKind::If.is_keyword());
        assert!(TokenKind::End.is_keyword());
        assert!(!TokenKind::Integer(42).is_keyword());
        assert!(!TokenKind::Identifier("CALL".to_string()).is_keyword());
    }

    #[test]
    fn test_describe() {
        let token = Token::new(TokenKind::Eol, "\n".to_string(), 3, 9);
        assert_eq!(token.describe(), "end of line");
        let token = Token::new(TokenKind::Identifier("foo".into()), "foo".into(), 1, 0);
        assert_eq!(token.describe(), "identifier `foo`");
    }
}
