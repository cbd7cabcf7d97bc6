// Recursive-descent parser over the lexer's token stream

use crate::ast::{BinaryOp, Expression, LogicalOp, Pos, Program, Statement, StatementKind};
use crate::error::{LexError, ParseError, SyntaxError};
use crate::lexer::{Token, TokenKind, tokenize};

/// Expressions and blocks nested deeper than this are rejected, keeping the
/// recursive descent well inside a default thread stack.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parse source text into a program, lexing lazily as tokens are needed.
pub fn parse_script(input: &str) -> Result<Program, ParseError> {
    parse(tokenize(input))
}

/// Parse a token stream. The stream must end with an `EOF` token.
pub fn parse<I>(tokens: I) -> Result<Program, ParseError>
where
    I: IntoIterator<Item = Result<Token, LexError>>,
{
    let mut parser = Parser::new(tokens.into_iter())?;
    parser.parse_program()
}

/// Why a statement block stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockEnd {
    Else,
    End,
}

struct Parser<I> {
    tokens: I,
    current: Token,
    depth: usize,
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token, LexError>>,
{
    fn new(mut tokens: I) -> Result<Self, ParseError> {
        let current = Self::pull(&mut tokens)?;
        Ok(Self {
            tokens,
            current,
            depth: 0,
        })
    }

    /// Fetch the next token. A stream that runs dry is treated as `EOF`.
    fn pull(tokens: &mut I) -> Result<Token, ParseError> {
        match tokens.next() {
            Some(token) => Ok(token?),
            None => Ok(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line: 0,
                col: 0,
            }),
        }
    }

    fn peek(&self) -> &Token {
        &self.current
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token and return it.
    fn take(&mut self) -> Result<Token, ParseError> {
        if self.at(TokenKind::Eof) {
            return Ok(self.current.clone());
        }
        let next = Self::pull(&mut self.tokens)?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            self.take()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let t = self.peek();
        SyntaxError::UnexpectedToken {
            expected: expected.to_string(),
            found: t.kind,
            lexeme: t.lexeme.clone(),
            line: t.line,
            col: t.col,
        }
        .into()
    }

    /// Enter one level of expression or block nesting.
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let t = self.peek();
            return Err(SyntaxError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                line: t.line,
                col: t.col,
            }
            .into());
        }
        self.depth += 1;
        Ok(())
    }

    fn skip_separators(&mut self) -> Result<(), ParseError> {
        while self.at(TokenKind::Semicolon) {
            self.take()?;
        }
        Ok(())
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators()?;
            if self.at(TokenKind::Eof) {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    /// Parse statements until `END` (or `ELSE` when `allow_else`).
    /// Returns `None` for the terminator when the input ran out first.
    fn parse_block(
        &mut self,
        allow_else: bool,
    ) -> Result<(Vec<Statement>, Option<BlockEnd>), ParseError> {
        self.descend()?;
        let block = self.parse_block_body(allow_else);
        self.depth -= 1;
        block
    }

    fn parse_block_body(
        &mut self,
        allow_else: bool,
    ) -> Result<(Vec<Statement>, Option<BlockEnd>), ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators()?;
            let t = self.peek();
            if t.kind == TokenKind::Eof {
                return Ok((statements, None));
            }
            if t.is_keyword("end") {
                self.take()?;
                return Ok((statements, Some(BlockEnd::End)));
            }
            if allow_else && t.is_keyword("else") {
                self.take()?;
                return Ok((statements, Some(BlockEnd::Else)));
            }
            statements.push(self.parse_statement()?);
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().clone();
        let pos = Pos {
            line: start.line,
            col: start.col,
        };

        if start.kind != TokenKind::Ident {
            return Err(Self::invalid_statement(&start));
        }

        let keyword = start.lexeme.to_ascii_lowercase();
        let kind = match keyword.as_str() {
            "set" => {
                self.take()?;
                let name = self.expect(TokenKind::Ident, "variable name")?.lexeme;
                self.expect(TokenKind::Assign, "'='")?;
                let value = self.parse_expression()?;
                StatementKind::Assign { name, value }
            }
            "print" => {
                self.take()?;
                StatementKind::Print(self.parse_expression()?)
            }
            "log" => {
                self.take()?;
                StatementKind::Log(self.parse_expression()?)
            }
            "if" => {
                self.take()?;
                self.parse_if(pos)?
            }
            "while" => {
                self.take()?;
                let condition = self.parse_expression()?;
                let (body, end) = self.parse_block(false)?;
                if end.is_none() {
                    return Err(SyntaxError::MissingEnd {
                        construct: "WHILE",
                        line: pos.line,
                        col: pos.col,
                    }
                    .into());
                }
                StatementKind::While { condition, body }
            }
            "writefile" | "appendfile" => {
                self.take()?;
                let path = self.parse_expression()?;
                self.skip_separators()?;
                let content = self.parse_expression()?;
                if keyword == "writefile" {
                    StatementKind::WriteFile { path, content }
                } else {
                    StatementKind::AppendFile { path, content }
                }
            }
            "readfile" => {
                self.take()?;
                let path = self.parse_expression()?;
                self.skip_separators()?;
                let target = self.expect(TokenKind::Ident, "variable name")?.lexeme;
                StatementKind::ReadFile { path, target }
            }
            "deletefile" => {
                self.take()?;
                StatementKind::DeleteFile(self.parse_expression()?)
            }
            "function" => {
                self.take()?;
                self.parse_function_def(pos)?
            }
            "return" => {
                self.take()?;
                StatementKind::Return(self.parse_expression()?)
            }
            _ => {
                self.take()?;
                if !self.at(TokenKind::LParen) {
                    return Err(Self::invalid_statement(&start));
                }
                let args = self.parse_call_args()?;
                StatementKind::Call {
                    name: start.lexeme,
                    args,
                }
            }
        };

        Ok(Statement { kind, pos })
    }

    fn invalid_statement(t: &Token) -> ParseError {
        SyntaxError::InvalidStatement {
            found: t.kind,
            lexeme: t.lexeme.clone(),
            line: t.line,
            col: t.col,
        }
        .into()
    }

    fn parse_if(&mut self, pos: Pos) -> Result<StatementKind, ParseError> {
        let missing_end = || -> ParseError {
            SyntaxError::MissingEnd {
                construct: "IF",
                line: pos.line,
                col: pos.col,
            }
            .into()
        };

        let condition = self.parse_expression()?;
        let (then_block, end) = self.parse_block(true)?;
        let else_block = match end {
            None => return Err(missing_end()),
            Some(BlockEnd::End) => None,
            Some(BlockEnd::Else) => {
                let (block, end) = self.parse_block(false)?;
                if end.is_none() {
                    return Err(missing_end());
                }
                Some(block)
            }
        };

        Ok(StatementKind::If {
            condition,
            then_block,
            else_block,
        })
    }

    fn parse_function_def(&mut self, pos: Pos) -> Result<StatementKind, ParseError> {
        let name = self.expect(TokenKind::Ident, "function name")?.lexeme;
        self.expect(TokenKind::LParen, "'('")?;

        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.expect(TokenKind::Ident, "parameter name")?.lexeme);
                if self.at(TokenKind::Comma) {
                    self.take()?;
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let (body, end) = self.parse_block(false)?;
        if end.is_none() {
            return Err(SyntaxError::MissingFunctionEnd {
                name,
                line: pos.line,
                col: pos.col,
            }
            .into());
        }

        Ok(StatementKind::FunctionDef { name, params, body })
    }

    /// `( (expr (, expr)*)? )` with the current token on the `(`.
    fn parse_call_args(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.at(TokenKind::Comma) {
                    self.take()?;
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' or ','")?;
        Ok(args)
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.descend()?;
        let expr = self.parse_logic();
        self.depth -= 1;
        expr
    }

    fn parse_logic(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = if self.peek().is_keyword("and") {
                LogicalOp::And
            } else if self.peek().is_keyword("or") {
                LogicalOp::Or
            } else {
                break;
            };
            self.take()?;
            let right = self.parse_comparison()?;
            left = Expression::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// At most one comparison: `a < b < c` does not chain.
    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_sum()?;
        let op = match self.peek().kind {
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            _ => return Ok(left),
        };
        self.take()?;
        let right = self.parse_sum()?;
        Ok(Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_sum(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.take()?;
            let right = self.parse_term()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.take()?;
            let right = self.parse_factor()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expression, ParseError> {
        match self.peek().kind {
            TokenKind::LParen => {
                self.take()?;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Str => {
                let t = self.take()?;
                Ok(Expression::String(unescape(&t.lexeme)))
            }
            TokenKind::Number => {
                let t = self.take()?;
                let value = t.lexeme.parse::<i64>().map_err(|_| SyntaxError::NumberOutOfRange {
                    lexeme: t.lexeme.clone(),
                    line: t.line,
                    col: t.col,
                })?;
                Ok(Expression::Number(value))
            }
            TokenKind::Ident => {
                let name = self.take()?.lexeme;
                if self.at(TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    Ok(Expression::Call { name, args })
                } else {
                    Ok(Expression::Variable(name))
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}

/// Strip the surrounding quotes of a string token and decode backslash escapes.
/// Unknown escapes are kept as written.
pub fn unescape(lexeme: &str) -> String {
    let body = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme);

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
