// Runtime values

use std::cmp::Ordering;
use std::fmt;

use crate::ast::BinaryOp;
use crate::error::RuntimeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    String(String),
    Boolean(bool),
    /// Result of a function that finished without `return`.
    None,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::None => "none",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::None => false,
        }
    }

    /// Apply an arithmetic or comparison operator.
    pub fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
        match op {
            BinaryOp::Add => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => a
                    .checked_add(b)
                    .map(Value::Integer)
                    .ok_or(RuntimeError::Overflow { op: "+" }),
                (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                    Ok(Value::String(format!("{a}{b}")))
                }
                (a, b) => Err(unsupported(op, &a, &b)),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let (Value::Integer(a), Value::Integer(b)) = (&left, &right) else {
                    return Err(unsupported(op, &left, &right));
                };
                let result = match op {
                    BinaryOp::Sub => a.checked_sub(*b),
                    BinaryOp::Mul => a.checked_mul(*b),
                    _ if *b == 0 => return Err(RuntimeError::DivisionByZero),
                    _ => a.checked_div(*b),
                };
                result
                    .map(Value::Integer)
                    .ok_or(RuntimeError::Overflow { op: op.symbol() })
            }
            BinaryOp::Gt
            | BinaryOp::Lt
            | BinaryOp::GtEq
            | BinaryOp::LtEq
            | BinaryOp::Eq
            | BinaryOp::NotEq => {
                let ordering = compare(&left, &right).ok_or_else(|| unsupported(op, &left, &right))?;
                let result = match op {
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::GtEq => ordering != Ordering::Less,
                    BinaryOp::LtEq => ordering != Ordering::Greater,
                    BinaryOp::Eq => ordering == Ordering::Equal,
                    _ => ordering != Ordering::Equal,
                };
                Ok(Value::Boolean(result))
            }
        }
    }
}

/// Ordering between two values of the same type; `None` for mixed types.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::None, Value::None) => Some(Ordering::Equal),
        _ => None,
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperands {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::None => f.write_str("none"),
        }
    }
}
