use std::str::Chars;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Maximize,
    Minimize,
    Subject,
    To,

    // Literals
    Ident,
    Number,

    // Operators
    Plus,
    Minus,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,

    // Special
    Newline,
    Comment,
    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}

/// Character-level lexer for algebraic linear-program text.
///
/// `+` and `-` are always emitted as their own tokens, never folded into a
/// following number: the term grammar owns signs, and the parser needs to
/// see every operator to reject dangling ones like `a + + b`.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    pos: usize,
    current: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            pos: 0,
            current,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current;
        self.current = self.chars.next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // first /
        self.advance(); // second /
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        Token::new(
            TokenKind::Comment,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn skip_block_comment(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.peek() {
                Some('*') => {
                    self.advance();
                    if self.peek() == Some('/') {
                        self.advance();
                        break;
                    }
                }
                Some(_) => {
                    self.advance();
                }
                None => break, // Unterminated comment
            }
        }
        Token::new(
            TokenKind::Comment,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // Decimal part only when a digit follows the dot
        if self.peek() == Some('.') {
            let mut chars = self.chars.clone();
            if let Some(next) = chars.next() {
                if next.is_ascii_digit() {
                    self.advance(); // consume the dot
                    while let Some(c) = self.peek() {
                        if c.is_ascii_digit() {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
            }
        }

        Token::new(
            TokenKind::Number,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn read_ident(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = match text {
            "maximize" | "max" => TokenKind::Maximize,
            "minimize" | "min" => TokenKind::Minimize,
            "subject" => TokenKind::Subject,
            "to" => TokenKind::To,
            _ => TokenKind::Ident,
        };
        Token::new(kind, Span::new(start, self.pos), text)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), "");
        };

        match c {
            '\n' => {
                self.advance();
                Token::new(TokenKind::Newline, Span::new(start, self.pos), "\n")
            }
            '/' => {
                let mut chars = self.chars.clone();
                match chars.next() {
                    Some('/') => self.skip_line_comment(),
                    Some('*') => self.skip_block_comment(),
                    _ => {
                        self.advance();
                        Token::new(TokenKind::Error, Span::new(start, self.pos), "/")
                    }
                }
            }
            '+' => {
                self.advance();
                Token::new(TokenKind::Plus, Span::new(start, self.pos), "+")
            }
            '-' => {
                self.advance();
                Token::new(TokenKind::Minus, Span::new(start, self.pos), "-")
            }
            '=' => {
                self.advance();
                Token::new(TokenKind::Eq, Span::new(start, self.pos), "=")
            }
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::Le, Span::new(start, self.pos), "<=")
                } else {
                    Token::new(TokenKind::Lt, Span::new(start, self.pos), "<")
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::Ge, Span::new(start, self.pos), ">=")
                } else {
                    Token::new(TokenKind::Gt, Span::new(start, self.pos), ">")
                }
            }
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => self.read_ident(),
            _ => {
                self.advance();
                Token::new(
                    TokenKind::Error,
                    Span::new(start, self.pos),
                    &self.source[start..self.pos],
                )
            }
        }
    }
}
