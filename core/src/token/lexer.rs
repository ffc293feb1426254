use std::fmt;

use crate::token::{ParseError, Position, Span};
use anyhow::{Result, anyhow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Colon,     // :
    Comma,     // ,
    Semicolon, // ;
    Assign,    // =
    Eq,        // ==
    Ne,        // !=
    Gt,        // >
    Lt,        // <
    Not,       // !
    Add,       // +
    Sub,       // -
    Mul,       // *
    Div,       // /
    // Keywords
    Fn,     // fn
    Let,    // let
    If,     // if
    Else,   // else
    Return, // return
    Bool(bool),  // true, false
    Int(i64),    // 1
    Str(String), // "abc"
    Id(String),  // identifier
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Assign => "=",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Gt => ">",
            Token::Lt => "<",
            Token::Not => "!",
            Token::Add => "+",
            Token::Sub => "-",
            Token::Mul => "*",
            Token::Div => "/",
            Token::Fn => "fn",
            Token::Let => "let",
            Token::If => "if",
            Token::Else => "else",
            Token::Return => "return",
            Token::Bool(b) => return write!(f, "{b}"),
            Token::Int(i) => return write!(f, "{i}"),
            Token::Str(s) => return write!(f, "{s:?}"),
            Token::Id(name) => return write!(f, "{name}"),
        };
        f.write_str(s)
    }
}

fn keyword(ident: &str) -> Option<Token> {
    match ident {
        "fn" => Some(Token::Fn),
        "let" => Some(Token::Let),
        "if" => Some(Token::If),
        "else" => Some(Token::Else),
        "return" => Some(Token::Return),
        "true" => Some(Token::Bool(true)),
        "false" => Some(Token::Bool(false)),
        _ => None,
    }
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// [chars] and [idx] can be used for syntax error reporting.
pub struct Tokenizer<'a> {
    chars: Vec<char>,
    idx: usize,
    len: usize,
    pub tokens: Vec<Token>,
    pub token_spans: Vec<Span>,
    line: u32,
    column: u32,
    input: &'a str,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        Self {
            len: chars.len(),
            chars,
            idx: 0,
            tokens: Vec::with_capacity(input.len() / 4),
            token_spans: Vec::with_capacity(input.len() / 4),
            line: 1,
            column: 1,
            input,
        }
    }

    pub fn tokenize(s: &str) -> Result<Vec<Token>> {
        let mut t = Tokenizer::new(s);
        t.parse()?;
        Ok(t.tokens)
    }

    /// Tokenize and return tokens with spans aligned by index.
    pub fn tokenize_with_spans(s: &str) -> std::result::Result<(Vec<Token>, Vec<Span>), ParseError> {
        let mut t = Tokenizer::new(s);
        match t.parse() {
            Ok(()) => Ok((t.tokens, t.token_spans)),
            Err(err) => Err(ParseError::with_position(err.to_string(), t.current_position())),
        }
    }

    pub fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.idx)
    }

    fn eof(&self) -> bool {
        self.idx >= self.len
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.idx + 1).copied()
    }

    fn err<T: AsRef<str>>(&self, msg: T) -> String {
        let line_context = self
            .input
            .lines()
            .nth((self.line as usize).saturating_sub(1))
            .unwrap_or_default();
        match self.peek() {
            Some(c) => format!("{} ('{}'), line {}: {}", msg.as_ref(), c, self.line, line_context),
            None => format!("{} (at end), line {}: {}", msg.as_ref(), self.line, line_context),
        }
    }

    fn advance_char(&mut self) {
        if !self.eof() && self.chars[self.idx] == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.idx += 1;
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_next()) {
                (Some(c), _) if c.is_whitespace() => self.advance_char(),
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        self.advance_char();
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.advance_char();
                    self.advance_char();
                    loop {
                        match (self.peek(), self.peek_next()) {
                            (Some('*'), Some('/')) => {
                                self.advance_char();
                                self.advance_char();
                                break;
                            }
                            (Some(_), _) => self.advance_char(),
                            (None, _) => return Err(anyhow!(self.err("Unterminated block comment"))),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn push(&mut self, token: Token, start: Position) {
        self.tokens.push(token);
        self.token_spans.push(Span::new(start, self.current_position()));
    }

    fn parse(&mut self) -> Result<()> {
        loop {
            self.skip_trivia()?;
            let Some(c) = self.peek() else {
                return Ok(());
            };
            let start = self.current_position();
            let token = match c {
                '(' => Token::LParen,
                ')' => Token::RParen,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                ':' => Token::Colon,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '+' => Token::Add,
                '-' => Token::Sub,
                '*' => Token::Mul,
                '/' => Token::Div,
                '<' => Token::Lt,
                '>' => Token::Gt,
                '=' if self.peek_next() == Some('=') => {
                    self.advance_char();
                    Token::Eq
                }
                '=' => Token::Assign,
                '!' if self.peek_next() == Some('=') => {
                    self.advance_char();
                    Token::Ne
                }
                '!' => Token::Not,
                '"' => {
                    let s = self.read_string()?;
                    self.push(Token::Str(s), start);
                    continue;
                }
                c if c.is_ascii_digit() => {
                    let n = self.read_int()?;
                    self.push(Token::Int(n), start);
                    continue;
                }
                c if is_ident_start(c) => {
                    let ident = self.read_ident();
                    let token = keyword(&ident).unwrap_or(Token::Id(ident));
                    self.push(token, start);
                    continue;
                }
                _ => return Err(anyhow!(self.err("Unexpected character"))),
            };
            self.advance_char();
            self.push(token, start);
        }
    }

    fn read_ident(&mut self) -> String {
        let begin = self.idx;
        while self.peek().is_some_and(is_ident_continue) {
            self.advance_char();
        }
        self.chars[begin..self.idx].iter().collect()
    }

    fn read_int(&mut self) -> Result<i64> {
        let begin = self.idx;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }
        let literal: String = self.chars[begin..self.idx].iter().collect();
        literal
            .parse::<i64>()
            .map_err(|_| anyhow!(self.err(format!("could not parse {literal:?} as integer"))))
    }

    fn read_string(&mut self) -> Result<String> {
        // opening quote
        self.advance_char();
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(anyhow!(self.err("Unterminated string literal")));
            };
            self.advance_char();
            match c {
                '"' => return Ok(out),
                '\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(anyhow!(self.err("Unterminated string literal")));
                    };
                    self.advance_char();
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        other => return Err(anyhow!(self.err(format!("Unknown escape sequence '\\{other}'")))),
                    }
                }
                c => out.push(c),
            }
        }
    }
}
