use super::token::{Token, TokenKind};

/// Scanner for line-oriented Pati source
///
/// Scanning never fails: characters that start no token become
/// [`TokenKind::Illegal`] and are reported by the parser.
pub struct LineScanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Column of the current position (0-indexed)
    column: usize,
    /// Column where the current token starts
    start_column: usize,
    /// Treat `REM` as the start of a comment
    comments_enabled: bool,
}

impl LineScanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        LineScanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 0,
            start_column: 0,
            comments_enabled: true,
        }
    }

    /// Enables or disables `REM` comments
    pub fn with_comments(mut self, enabled: bool) -> Self {
        self.comments_enabled = enabled;
        self
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_column = self.column;
            self.scan_token();
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        std::mem::take(&mut self.tokens)
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' => {}

            '\n' => {
                self.add_token(TokenKind::Eol);
                self.line += 1;
                self.column = 0;
            }

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),

            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            '=' => self.add_token(TokenKind::Equal),
            '<' => {
                if self.match_char('>') {
                    self.add_token(TokenKind::NotEqual);
                } else if self.match_char('=') {
                    self.add_token(TokenKind::LessEqual);
                } else {
                    self.add_token(TokenKind::Less);
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::GreaterEqual);
                } else {
                    self.add_token(TokenKind::Greater);
                }
            }

            '"' => self.scan_string(),

            c if c.is_ascii_digit() => self.scan_number(),

            c if c.is_alphabetic() => self.scan_identifier_or_keyword(),

            _ => self.add_token(TokenKind::Illegal),
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn scan_string(&mut self) {
        while !self.is_at_end() && self.peek() != '"' && self.peek() != '\n' {
            self.advance();
        }

        if self.peek() != '"' {
            // Unterminated: the string may not span lines
            self.add_token(TokenKind::Illegal);
            return;
        }

        self.advance(); // Closing "

        let value: String = self.source[self.start + 1..self.current - 1]
            .iter()
            .collect();
        self.add_token(TokenKind::String(value));
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        match text.parse::<i64>() {
            Ok(value) => self.add_token(TokenKind::Integer(value)),
            Err(_) => self.add_token(TokenKind::Illegal),
        }
    }

    fn scan_identifier_or_keyword(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        if self.comments_enabled && text == "REM" {
            self.skip_line_comment();
            return;
        }

        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text));
        self.add_token(kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.column += 1;
            true
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens
            .push(Token::new(kind, lexeme, self.line, self.start_column));
    }
}
