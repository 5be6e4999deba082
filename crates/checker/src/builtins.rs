/// Built-in function signatures.
///
/// The registry is fixed and separate from user functions; scripts cannot
/// define a function with one of these names. The runtime implements each
/// entry.

use ferris_language::Type;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Params {
    Fixed(&'static [Type]),
    /// Any number of arguments of any non-void type.
    Variadic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltinSignature {
    pub name: &'static str,
    pub params: Params,
    pub ret: Type,
}

pub const BUILTINS: &[BuiltinSignature] = &[
    BuiltinSignature { name: "print", params: Params::Variadic, ret: Type::Void },
    BuiltinSignature { name: "abs", params: Params::Fixed(&[Type::Float]), ret: Type::Float },
    BuiltinSignature { name: "sqrt", params: Params::Fixed(&[Type::Float]), ret: Type::Float },
    BuiltinSignature { name: "min", params: Params::Fixed(&[Type::Float, Type::Float]), ret: Type::Float },
    BuiltinSignature { name: "max", params: Params::Fixed(&[Type::Float, Type::Float]), ret: Type::Float },
    BuiltinSignature {
        name: "clamp",
        params: Params::Fixed(&[Type::Float, Type::Float, Type::Float]),
        ret: Type::Float,
    },
    BuiltinSignature { name: "vec2", params: Params::Fixed(&[Type::Float, Type::Float]), ret: Type::Vector2 },
    BuiltinSignature { name: "len", params: Params::Fixed(&[Type::String]), ret: Type::Int },
];

pub fn lookup(name: &str) -> Option<&'static BuiltinSignature> {
    BUILTINS.iter().find(|b| b.name == name)
}

pub fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("print").map(|b| b.params), Some(Params::Variadic));
        assert_eq!(lookup("vec2").map(|b| b.ret), Some(Type::Vector2));
        assert!(lookup("_process").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in BUILTINS.iter().enumerate() {
            assert!(BUILTINS[i + 1..].iter().all(|b| b.name != a.name), "{}", a.name);
        }
    }
}
