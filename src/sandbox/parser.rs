// Sandbox parser
// Recursive-descent parser from tokens to a line-tagged statement tree

use super::lexer::{Spanned, Token};
use super::SandboxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Var(String),
    /// `arr[index]`
    Element(Box<Expr>),
    /// `len(arr)`
    Len,
    Min(Box<Expr>, Box<Expr>),
    Max(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Assignment operator; `Set` is plain `=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnValue {
    /// `return;` or falling off the end: the recorded steps
    Steps,
    /// `return arr;`: the current array as the only snapshot
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Let(String, Expr),
    Assign(String, AssignOp, Expr),
    SetElement(Expr, AssignOp, Expr),
    Swap(Expr, Expr),
    Record(Vec<Expr>),
    If(Expr, Vec<Stmt>, Vec<Stmt>),
    While(Expr, Vec<Stmt>),
    For {
        var: String,
        start: Expr,
        end: Expr,
        reverse: bool,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    Return(ReturnValue),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

/// Names the program can read but never declare or assign
const RESERVED: [&str; 7] = ["arr", "steps", "len", "min", "max", "swap", "record"];

/// Deepest combined statement and expression nesting a program may use
///
/// Bounds the recursion of both the parser and the evaluator.
pub const MAX_NESTING: usize = 128;

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream as a statement list
    pub fn parse_program(&mut self) -> Result<Vec<Stmt>, SandboxError> {
        let mut program = Vec::new();
        while self.peek().is_some() {
            program.push(self.statement()?);
        }
        Ok(program)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    /// Go one level deeper; fails past [`MAX_NESTING`]
    fn enter(&mut self) -> Result<(), SandboxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return self.error("nesting too deep");
        }
        Ok(())
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, SandboxError> {
        Err(SandboxError::Parse {
            line: self.line(),
            message: message.into(),
        })
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), SandboxError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            match self.peek() {
                Some(found) => self.error(format!("expected {}, found {:?}", what, found)),
                None => self.error(format!("expected {}, found end of program", what)),
            }
        }
    }

    fn identifier(&mut self) -> Result<String, SandboxError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => self.error("expected a name"),
        }
    }

    fn writable_name(&mut self) -> Result<String, SandboxError> {
        let name = self.identifier()?;
        if RESERVED.contains(&name.as_str()) {
            self.pos -= 1;
            return self.error(format!("'{}' cannot be assigned", name));
        }
        Ok(name)
    }

    fn block(&mut self) -> Result<Vec<Stmt>, SandboxError> {
        self.expect(Token::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.peek().is_none() {
                return self.error("unclosed block");
            }
            body.push(self.statement()?);
        }
        Ok(body)
    }

    fn statement(&mut self) -> Result<Stmt, SandboxError> {
        self.enter()?;
        let stmt = self.statement_inner()?;
        self.depth -= 1;
        Ok(stmt)
    }

    fn statement_inner(&mut self) -> Result<Stmt, SandboxError> {
        let line = self.line();
        let kind = match self.peek() {
            Some(Token::Let) => {
                self.pos += 1;
                let name = self.writable_name()?;
                self.expect(Token::Assign, "'='")?;
                let value = self.expression()?;
                self.expect(Token::Semicolon, "';'")?;
                StmtKind::Let(name, value)
            }
            Some(Token::If) => self.if_statement()?,
            Some(Token::While) => {
                self.pos += 1;
                let cond = self.expression()?;
                StmtKind::While(cond, self.block()?)
            }
            Some(Token::For) => {
                self.pos += 1;
                let var = self.writable_name()?;
                self.expect(Token::In, "'in'")?;
                let reverse = self.eat(&Token::Rev);
                let start = self.expression()?;
                self.expect(Token::DotDot, "'..'")?;
                let end = self.expression()?;
                let body = self.block()?;
                StmtKind::For {
                    var,
                    start,
                    end,
                    reverse,
                    body,
                }
            }
            Some(Token::Break) => {
                self.pos += 1;
                self.expect(Token::Semicolon, "';'")?;
                StmtKind::Break
            }
            Some(Token::Continue) => {
                self.pos += 1;
                self.expect(Token::Semicolon, "';'")?;
                StmtKind::Continue
            }
            Some(Token::Return) => {
                self.pos += 1;
                let value = match self.peek().cloned() {
                    Some(Token::Semicolon) => ReturnValue::Steps,
                    Some(Token::Ident(name)) if name == "steps" => {
                        self.pos += 1;
                        ReturnValue::Steps
                    }
                    Some(Token::Ident(name)) if name == "arr" => {
                        self.pos += 1;
                        ReturnValue::Array
                    }
                    _ => {
                        return self.error("only 'return arr;' or 'return steps;' are allowed");
                    }
                };
                self.expect(Token::Semicolon, "';'")?;
                StmtKind::Return(value)
            }
            Some(Token::Ident(_)) => {
                let kind = self.simple_statement()?;
                self.expect(Token::Semicolon, "';'")?;
                kind
            }
            Some(other) => return self.error(format!("unexpected {:?}", other)),
            None => return self.error("unexpected end of program"),
        };
        Ok(Stmt { kind, line })
    }

    fn if_statement(&mut self) -> Result<StmtKind, SandboxError> {
        self.expect(Token::If, "'if'")?;
        let cond = self.expression()?;
        let then_branch = self.block()?;

        let else_branch = if self.eat(&Token::Else) {
            if self.peek() == Some(&Token::If) {
                let line = self.line();
                self.enter()?;
                let kind = self.if_statement()?;
                self.depth -= 1;
                vec![Stmt { kind, line }]
            } else {
                self.block()?
            }
        } else {
            Vec::new()
        };

        Ok(StmtKind::If(cond, then_branch, else_branch))
    }

    /// Assignments and the `swap` / `record` built-ins
    fn simple_statement(&mut self) -> Result<StmtKind, SandboxError> {
        let name = match self.peek() {
            Some(Token::Ident(name)) => name.clone(),
            _ => return self.error("expected a statement"),
        };

        match name.as_str() {
            "swap" => {
                self.pos += 1;
                let args = self.arguments()?;
                match <[Expr; 2]>::try_from(args) {
                    Ok([a, b]) => Ok(StmtKind::Swap(a, b)),
                    Err(_) => self.error("swap takes exactly two positions"),
                }
            }
            "record" => {
                self.pos += 1;
                Ok(StmtKind::Record(self.arguments()?))
            }
            "arr" if self.peek_at(1) == Some(&Token::LBracket) => {
                self.pos += 2;
                let index = self.expression()?;
                self.expect(Token::RBracket, "']'")?;
                let op = self.assign_op()?;
                Ok(StmtKind::SetElement(index, op, self.expression()?))
            }
            _ => {
                let name = self.writable_name()?;
                let op = self.assign_op()?;
                Ok(StmtKind::Assign(name, op, self.expression()?))
            }
        }
    }

    fn assign_op(&mut self) -> Result<AssignOp, SandboxError> {
        let op = match self.peek() {
            Some(Token::Assign) => AssignOp::Set,
            Some(Token::PlusAssign) => AssignOp::Add,
            Some(Token::MinusAssign) => AssignOp::Sub,
            _ => return self.error("expected '=', '+=' or '-='"),
        };
        self.pos += 1;
        Ok(op)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, SandboxError> {
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(Token::Comma, "',' or ')'")?;
        }
    }

    pub fn expression(&mut self) -> Result<Expr, SandboxError> {
        self.enter()?;
        let expr = self.or_expr()?;
        self.depth -= 1;
        Ok(expr)
    }

    // Each operator in a left-associative chain nests the tree one level,
    // so chains count against the depth until the chain ends.

    fn or_expr(&mut self) -> Result<Expr, SandboxError> {
        let base = self.depth;
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::OrOr) {
            self.enter()?;
            let rhs = self.and_expr()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, SandboxError> {
        let base = self.depth;
        let mut lhs = self.comparison()?;
        while self.eat(&Token::AndAnd) {
            self.enter()?;
            let rhs = self.comparison()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, SandboxError> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::NotEq) => BinaryOp::NotEq,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::LtEq) => BinaryOp::LtEq,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::GtEq) => BinaryOp::GtEq,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.additive()?;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn additive(&mut self) -> Result<Expr, SandboxError> {
        let base = self.depth;
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => {
                    self.depth = base;
                    return Ok(lhs);
                }
            };
            self.pos += 1;
            self.enter()?;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, SandboxError> {
        let base = self.depth;
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => {
                    self.depth = base;
                    return Ok(lhs);
                }
            };
            self.pos += 1;
            self.enter()?;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, SandboxError> {
        let op = if self.eat(&Token::Minus) {
            UnaryOp::Neg
        } else if self.eat(&Token::Bang) {
            UnaryOp::Not
        } else {
            return self.primary();
        };

        self.enter()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Result<Expr, SandboxError> {
        match self.advance() {
            Some(Token::Int(value)) => Ok(Expr::Int(value)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "arr" => {
                    self.expect(Token::LBracket, "'[' after 'arr'")?;
                    let index = self.expression()?;
                    self.expect(Token::RBracket, "']'")?;
                    Ok(Expr::Element(Box::new(index)))
                }
                "len" => {
                    self.expect(Token::LParen, "'('")?;
                    if !matches!(self.peek(), Some(Token::Ident(arg)) if arg == "arr") {
                        return self.error("len only accepts 'arr'");
                    }
                    self.pos += 1;
                    self.expect(Token::RParen, "')'")?;
                    Ok(Expr::Len)
                }
                "min" | "max" => {
                    let args = self.arguments()?;
                    match <[Expr; 2]>::try_from(args) {
                        Ok([a, b]) if name == "min" => Ok(Expr::Min(Box::new(a), Box::new(b))),
                        Ok([a, b]) => Ok(Expr::Max(Box::new(a), Box::new(b))),
                        Err(_) => self.error(format!("{} takes exactly two values", name)),
                    }
                }
                "steps" | "swap" | "record" => {
                    self.pos -= 1;
                    self.error(format!("'{}' cannot be used as a value", name))
                }
                _ => Ok(Expr::Var(name)),
            },
            Some(other) => {
                self.pos -= 1;
                self.error(format!("unexpected {:?} in expression", other))
            }
            None => self.error("unexpected end of program in expression"),
        }
    }
}

/// Tokenize and parse a program
pub fn parse(source: &str) -> Result<Vec<Stmt>, SandboxError> {
    let tokens = super::lexer::tokenize(source)?;
    Parser::new(tokens).parse_program()
}
