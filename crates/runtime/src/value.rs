/// Runtime values and their conversions to and from host types.

use ferris_language::Type;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vector2 {
    type Output = Vector2;
    fn div(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

/// Opaque handle to a node owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodeRef {
    pub node: u64,
}

/// A runtime value.
///
/// Serialized untagged so host property files read naturally:
/// `3`, `1.5`, `true`, `"text"`, `{"x": 1.0, "y": 2.0}`, `{"node": 7}`, `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Vector2(Vector2),
    Node(NodeRef),
    Void,
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Bool(_) => Type::Bool,
            Value::String(_) => Type::String,
            Value::Vector2(_) => Type::Vector2,
            Value::Node(_) => Type::Node,
            Value::Void => Type::Void,
        }
    }

    /// Numeric value as `f32`, widening integers.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Int(n) => Some(*n as f32),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read `.field` of a plain value. Node fields go through the host instead.
    pub fn field(&self, field: &str) -> Option<Value> {
        match (self, field) {
            (Value::Vector2(v), "x") => Some(Value::Float(v.x)),
            (Value::Vector2(v), "y") => Some(Value::Float(v.y)),
            _ => None,
        }
    }

    /// Replace `.field` in place. Returns false when the field does not exist
    /// or the new value is not numeric.
    pub fn set_field(&mut self, field: &str, value: &Value) -> bool {
        let (Value::Vector2(v), Some(n)) = (self, value.as_float()) else {
            return false;
        };
        match field {
            "x" => v.x = n,
            "y" => v.y = n,
            _ => return false,
        }
        true
    }

    /// Convert to `target`, applying the `i32 -> f32` widening. `Unknown`
    /// accepts any value.
    pub fn coerce(self, target: Type) -> Result<Value, ValueError> {
        match (target, self) {
            (Type::Unknown, value) => Ok(value),
            (Type::Float, Value::Int(n)) => Ok(Value::Float(n as f32)),
            (target, value) if value.ty() == target => Ok(value),
            (target, value) => Err(ValueError { expected: target, found: value.ty() }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => f.write_str(s),
            Value::Vector2(v) => write!(f, "{}", v),
            Value::Node(n) => write!(f, "Node#{}", n.node),
            Value::Void => f.write_str("()"),
        }
    }
}

/// A value was not of the kind a conversion required.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct ValueError {
    pub expected: Type,
    pub found: Type,
}

// --- Marshalling ---

macro_rules! value_conversions {
    ($($rust:ty => $variant:ident, $ty:expr;)*) => {
        $(
            impl From<$rust> for Value {
                fn from(v: $rust) -> Self {
                    Value::$variant(v)
                }
            }

            impl TryFrom<Value> for $rust {
                type Error = ValueError;

                fn try_from(value: Value) -> Result<Self, ValueError> {
                    match value.coerce($ty)? {
                        Value::$variant(v) => Ok(v),
                        other => Err(ValueError { expected: $ty, found: other.ty() }),
                    }
                }
            }
        )*
    };
}

value_conversions! {
    i32 => Int, Type::Int;
    f32 => Float, Type::Float;
    bool => Bool, Type::Bool;
    String => String, Type::String;
    Vector2 => Vector2, Type::Vector2;
    NodeRef => Node, Type::Node;
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Void
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(6.0).to_string(), "6.0");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Vector2(Vector2::new(1.0, 2.5)).to_string(), "(1.0, 2.5)");
        assert_eq!(Value::from("hi").to_string(), "hi");
    }

    #[test]
    fn test_coerce_widens_int_only() {
        assert_eq!(Value::Int(2).coerce(Type::Float), Ok(Value::Float(2.0)));
        assert_eq!(
            Value::Float(2.0).coerce(Type::Int),
            Err(ValueError { expected: Type::Int, found: Type::Float })
        );
        assert_eq!(Value::Bool(true).coerce(Type::Unknown), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_try_from() {
        assert_eq!(f32::try_from(Value::Int(4)), Ok(4.0));
        assert_eq!(Vector2::try_from(Value::from(Vector2::new(1.0, 2.0))), Ok(Vector2::new(1.0, 2.0)));
        assert!(i32::try_from(Value::from("4")).is_err());
    }

    #[test]
    fn test_set_field() {
        let mut v = Value::Vector2(Vector2::ZERO);
        assert!(v.set_field("x", &Value::Int(3)));
        assert_eq!(v.field("x"), Some(Value::Float(3.0)));
        assert!(!v.set_field("z", &Value::Float(1.0)));
        assert!(!Value::Int(1).set_field("x", &Value::Float(1.0)));
    }

    #[test]
    fn test_vector_ops() {
        let a = Vector2::new(1.0, 2.0);
        assert_eq!(a + a, Vector2::new(2.0, 4.0));
        assert_eq!(a * 3.0 - a, Vector2::new(2.0, 4.0));
        assert_eq!(-a / 2.0, Vector2::new(-0.5, -1.0));
    }
}
