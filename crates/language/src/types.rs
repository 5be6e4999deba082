/// FerrisScript static types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of static types a script can name, plus `Unknown`.
///
/// `Unknown` is never written by users. The checker assigns it to values that
/// only the host can describe (properties read through `self`) and to
/// expressions that already failed to check, so one mistake is reported once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Vector2,
    Node,
    Void,
    Unknown,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Type {
    /// Resolve a type name as written in source.
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "i32" => Some(Type::Int),
            "f32" => Some(Type::Float),
            "bool" => Some(Type::Bool),
            "String" => Some(Type::String),
            "Vector2" => Some(Type::Vector2),
            "Node" => Some(Type::Node),
            "void" => Some(Type::Void),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::Int => "i32",
            Type::Float => "f32",
            Type::Bool => "bool",
            Type::String => "String",
            Type::Vector2 => "Vector2",
            Type::Node => "Node",
            Type::Void => "void",
            Type::Unknown => "unknown",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Whether a value of type `actual` may be stored where `self` is expected.
    ///
    /// The only implicit conversion is the `i32 -> f32` widening.
    pub fn accepts(self, actual: Type) -> bool {
        self == actual
            || self == Type::Unknown
            || actual == Type::Unknown
            || (self == Type::Float && actual == Type::Int)
    }

    /// Type of `.field` on a value of this type, if the field exists.
    pub fn field(self, field: &str) -> Option<Type> {
        match (self, field) {
            (Type::Vector2, "x" | "y") => Some(Type::Float),
            // Node fields belong to the host and are only known at runtime.
            (Type::Node, _) | (Type::Unknown, _) => Some(Type::Unknown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_roundtrip() {
        for ty in [Type::Int, Type::Float, Type::Bool, Type::String, Type::Vector2, Type::Node, Type::Void] {
            assert_eq!(Type::from_name(ty.name()), Some(ty));
        }
        assert_eq!(Type::from_name("unknown"), None);
        assert_eq!(Type::from_name("int"), None);
    }

    #[test]
    fn test_widening_is_one_way() {
        assert!(Type::Float.accepts(Type::Int));
        assert!(!Type::Int.accepts(Type::Float));
        assert!(!Type::Int.accepts(Type::Bool));
        assert!(!Type::String.accepts(Type::Int));
    }

    #[test]
    fn test_unknown_is_compatible_both_ways() {
        assert!(Type::Vector2.accepts(Type::Unknown));
        assert!(Type::Unknown.accepts(Type::Bool));
    }

    #[test]
    fn test_field_table() {
        assert_eq!(Type::Vector2.field("x"), Some(Type::Float));
        assert_eq!(Type::Vector2.field("z"), None);
        assert_eq!(Type::Node.field("position"), Some(Type::Unknown));
        assert_eq!(Type::Int.field("x"), None);
    }
}
