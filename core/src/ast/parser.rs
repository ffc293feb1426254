use crate::{
    expr::Expr,
    op::{BinOp, UnaryOp},
    stmt::{Block, Program, Stmt},
    token::{ParseError, ParseErrors, Span, Token, Tokenizer},
};

type PResult<T> = std::result::Result<T, ParseError>;

/// Binding power of infix positions, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < >
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // f(x)
    Index,       // a[i]
}

fn infix_precedence(token: &Token) -> Precedence {
    match token {
        Token::Eq | Token::Ne => Precedence::Equals,
        Token::Lt | Token::Gt => Precedence::LessGreater,
        Token::Add | Token::Sub => Precedence::Sum,
        Token::Mul | Token::Div => Precedence::Product,
        Token::LParen => Precedence::Call,
        Token::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Parse a whole source text into a program.
pub fn parse_program(src: &str) -> Result<Program, ParseErrors> {
    let (tokens, spans) = Tokenizer::tokenize_with_spans(src)?;
    Parser::new_with_spans(&tokens, &spans).parse_program()
}

/// Operator-precedence parser over a token slice.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    token_spans: Option<&'a [Span]>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            token_spans: None,
        }
    }

    pub fn new_with_spans(tokens: &'a [Token], spans: &'a [Span]) -> Self {
        Self {
            tokens,
            pos: 0,
            token_spans: Some(spans),
        }
    }

    /// Parses every statement, collecting errors. A failed statement is
    /// skipped up to the next top-level `;` and parsing continues.
    pub fn parse_program(&mut self) -> Result<Program, ParseErrors> {
        let mut statements = Vec::new();
        let mut errors = Vec::new();
        while !self.eof() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }
        if errors.is_empty() {
            Ok(Program::new(statements))
        } else {
            Err(ParseErrors(errors))
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn peek_is(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_is(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        let span = self
            .token_spans
            .and_then(|spans| spans.get(self.pos).or_else(|| spans.last()).copied());
        match span {
            Some(span) => ParseError::with_span(msg, span),
            None => ParseError::new(msg),
        }
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(tok) => format!("'{tok}'"),
            None => "end of input".to_string(),
        }
    }

    fn expect(&mut self, token: &Token) -> PResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.err(format!(
                "expected next token to be '{}', got {} instead",
                token,
                self.describe_next()
            )))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match self.peek() {
            Some(Token::Id(name)) => {
                self.pos += 1;
                Ok(name.clone())
            }
            _ => Err(self.err(format!(
                "expected next token to be an identifier, got {} instead",
                self.describe_next()
            ))),
        }
    }

    fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.next() {
            match tok {
                Token::LBrace => depth += 1,
                Token::RBrace => depth = depth.saturating_sub(1),
                Token::Semicolon if depth == 0 => return,
                _ => {}
            }
        }
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        let stmt = match self.peek() {
            Some(Token::Let) => {
                self.pos += 1;
                let name = self.expect_ident()?;
                self.expect(&Token::Assign)?;
                let mut value = self.parse_expr(Precedence::Lowest)?;
                if let Expr::Function { name: fn_name, .. } = &mut value {
                    *fn_name = Some(name.clone());
                }
                Stmt::Let { name, value }
            }
            Some(Token::Return) => {
                self.pos += 1;
                Stmt::Return(self.parse_expr(Precedence::Lowest)?)
            }
            _ => Stmt::Expr(self.parse_expr(Precedence::Lowest)?),
        };
        self.eat(&Token::Semicolon);
        Ok(stmt)
    }

    /// Parses statements up to the closing brace; the opening brace must
    /// already be consumed.
    fn parse_block(&mut self) -> PResult<Block> {
        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(Block::new(statements));
                }
                Some(_) => statements.push(self.parse_statement()?),
                None => return Err(self.err("expected '}' to close block, got end of input")),
            }
        }
    }

    fn parse_expr(&mut self, precedence: Precedence) -> PResult<Expr> {
        let mut left = self.parse_prefix()?;
        while let Some(tok) = self.peek() {
            let next = infix_precedence(tok);
            if precedence >= next {
                break;
            }
            left = match tok {
                Token::LParen => {
                    self.pos += 1;
                    let args = self.parse_expr_list(&Token::RParen)?;
                    Expr::Call {
                        function: Box::new(left),
                        args,
                    }
                }
                Token::LBracket => {
                    self.pos += 1;
                    let index = self.parse_expr(Precedence::Lowest)?;
                    self.expect(&Token::RBracket)?;
                    Expr::Index(Box::new(left), Box::new(index))
                }
                other => {
                    // infix_precedence only ranks binary operators above Lowest
                    let Some(op) = BinOp::from_token(other) else {
                        break;
                    };
                    self.pos += 1;
                    let right = self.parse_expr(next)?;
                    Expr::Infix(Box::new(left), op, Box::new(right))
                }
            };
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> PResult<Expr> {
        let Some(tok) = self.peek() else {
            return Err(self.err("expected an expression, got end of input"));
        };
        let expr = match tok {
            Token::Id(name) => {
                self.pos += 1;
                Expr::Ident(name.clone())
            }
            Token::Int(i) => {
                self.pos += 1;
                Expr::Int(*i)
            }
            Token::Str(s) => {
                self.pos += 1;
                Expr::Str(s.clone())
            }
            Token::Bool(b) => {
                self.pos += 1;
                Expr::Bool(*b)
            }
            Token::Not | Token::Sub => {
                let Some(op) = UnaryOp::from_token(tok) else {
                    return Err(self.err(format!("no prefix parse function for '{tok}' found")));
                };
                self.pos += 1;
                let right = self.parse_expr(Precedence::Prefix)?;
                Expr::Prefix(op, Box::new(right))
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.parse_expr(Precedence::Lowest)?;
                self.expect(&Token::RParen)?;
                inner
            }
            Token::If => self.parse_if()?,
            Token::Fn => self.parse_function()?,
            Token::LBracket => {
                self.pos += 1;
                Expr::Array(self.parse_expr_list(&Token::RBracket)?)
            }
            Token::LBrace => self.parse_hash()?,
            other => return Err(self.err(format!("no prefix parse function for '{other}' found"))),
        };
        Ok(expr)
    }

    fn parse_if(&mut self) -> PResult<Expr> {
        self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let condition = self.parse_expr(Precedence::Lowest)?;
        self.expect(&Token::RParen)?;
        self.expect(&Token::LBrace)?;
        let consequence = self.parse_block()?;
        let alternative = if self.eat(&Token::Else) {
            self.expect(&Token::LBrace)?;
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function(&mut self) -> PResult<Expr> {
        self.expect(&Token::Fn)?;
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen)?;
                break;
            }
        }
        self.expect(&Token::LBrace)?;
        let body = self.parse_block()?;
        Ok(Expr::Function {
            name: None,
            params,
            body,
        })
    }

    fn parse_hash(&mut self) -> PResult<Expr> {
        self.expect(&Token::LBrace)?;
        let mut pairs = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Hash(pairs));
        }
        loop {
            let key = self.parse_expr(Precedence::Lowest)?;
            self.expect(&Token::Colon)?;
            let value = self.parse_expr(Precedence::Lowest)?;
            pairs.push((key, value));
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RBrace)?;
            return Ok(Expr::Hash(pairs));
        }
    }

    /// Comma-separated expressions up to `end`; the opening delimiter must
    /// already be consumed.
    fn parse_expr_list(&mut self, end: &Token) -> PResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat(end) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr(Precedence::Lowest)?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(end)?;
            return Ok(items);
        }
    }
}
