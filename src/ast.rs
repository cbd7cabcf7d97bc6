// Abstract Syntax Tree definitions

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// Source position of a statement's first token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Assign {
        name: String,
        value: Expression,
    },
    Print(Expression),
    Log(Expression),
    If {
        condition: Expression,
        then_block: Vec<Statement>,
        else_block: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    WriteFile {
        path: Expression,
        content: Expression,
    },
    AppendFile {
        path: Expression,
        content: Expression,
    },
    ReadFile {
        path: Expression,
        target: String,
    },
    DeleteFile(Expression),
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Vec<Statement>,
    },
    Call {
        name: String,
        args: Vec<Expression>,
    },
    Return(Expression),
}

impl StatementKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::Assign { .. } => "set",
            StatementKind::Print(_) => "print",
            StatementKind::Log(_) => "log",
            StatementKind::If { .. } => "if",
            StatementKind::While { .. } => "while",
            StatementKind::WriteFile { .. } => "writefile",
            StatementKind::AppendFile { .. } => "appendfile",
            StatementKind::ReadFile { .. } => "readfile",
            StatementKind::DeleteFile(_) => "deletefile",
            StatementKind::FunctionDef { .. } => "function",
            StatementKind::Call { .. } => "call",
            StatementKind::Return(_) => "return",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Eq,
    NotEq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::GtEq => ">=",
            BinaryOp::LtEq => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    String(String),
    Number(i64),
    Variable(String),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        name: String,
        args: Vec<Expression>,
    },
}
