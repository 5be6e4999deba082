/// Operator semantics on runtime values.
///
/// Integer arithmetic is checked: overflow and division by zero are errors.
/// Float arithmetic follows IEEE 754. Mixed int/float operands widen to float.

use crate::error::RuntimeErrorKind;
use crate::value::Value;
use ferris_language::Type;
use ferris_language::ast::{BinaryOp, UnaryOp};
use std::cmp::Ordering;

fn invalid(op: impl ToString, left: &Value, right: &Value) -> RuntimeErrorKind {
    RuntimeErrorKind::InvalidOperands { op: op.to_string(), left: left.ty(), right: right.ty() }
}

pub fn unary(op: UnaryOp, operand: Value) -> Result<Value, RuntimeErrorKind> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => {
            n.checked_neg().map(Value::Int).ok_or_else(|| RuntimeErrorKind::IntegerOverflow(op.to_string()))
        }
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::Neg, Value::Vector2(v)) => Ok(Value::Vector2(-v)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, other) => Err(RuntimeErrorKind::InvalidOperand { op: op.to_string(), operand: other.ty() }),
    }
}

pub fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeErrorKind> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => arithmetic(op, left, right),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let result = ordering(op, &left, &right).ok_or_else(|| invalid(op, &left, &right))?;
            Ok(Value::Bool(result))
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = equals(&left, &right).ok_or_else(|| invalid(op, &left, &right))?;
            Ok(Value::Bool(equal == (op == BinaryOp::Eq)))
        }
        BinaryOp::And | BinaryOp::Or => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::And { *a && *b } else { *a || *b })),
            _ => Err(invalid(op, &left, &right)),
        },
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeErrorKind> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b).map(Value::Int),
        (Value::Vector2(a), Value::Vector2(b)) => match op {
            BinaryOp::Add => Ok(Value::Vector2(*a + *b)),
            BinaryOp::Sub => Ok(Value::Vector2(*a - *b)),
            _ => Err(invalid(op, &left, &right)),
        },
        (Value::Vector2(v), n) if n.as_float().is_some() => {
            let n = n.as_float().unwrap_or_default();
            match op {
                BinaryOp::Mul => Ok(Value::Vector2(*v * n)),
                BinaryOp::Div => Ok(Value::Vector2(*v / n)),
                _ => Err(invalid(op, &left, &right)),
            }
        }
        (n, Value::Vector2(v)) if op == BinaryOp::Mul && n.as_float().is_some() => {
            Ok(Value::Vector2(*v * n.as_float().unwrap_or_default()))
        }
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => Ok(Value::String(format!("{}{}", a, b))),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_arithmetic(op, a, b))),
            _ => Err(invalid(op, &left, &right)),
        },
    }
}

fn int_arithmetic(op: BinaryOp, a: i32, b: i32) -> Result<i32, RuntimeErrorKind> {
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
        return Err(RuntimeErrorKind::DivisionByZero);
    }
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    result.ok_or_else(|| RuntimeErrorKind::IntegerOverflow(op.to_string()))
}

fn float_arithmetic(op: BinaryOp, a: f32, b: f32) -> f32 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }
}

/// Ordering test on two numbers. `None` for non-numbers; unordered pairs
/// (NaN) fail every test.
fn ordering(op: BinaryOp, left: &Value, right: &Value) -> Option<bool> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => left.as_float()?.partial_cmp(&right.as_float()?),
    };
    let Some(ordering) = ordering else {
        return Some(false);
    };
    Some(match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    })
}

fn equals(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a == b),
        (a, b) if a.as_float().is_some() && b.as_float().is_some() => Some(a.as_float() == b.as_float()),
        (a, b) if a.ty() == b.ty() && a.ty() != Type::Void => Some(a == b),
        _ => None,
    }
}
