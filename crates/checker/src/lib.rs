/// Ferris type checker: resolves names, enforces mutability and operand
/// types, and annotates the AST in place.

pub mod builtins;
pub mod symbol;
pub mod typeck;

pub use typeck::{CheckedProgram, TypeError, TypeErrorKind, binary_result_type, check, unary_result_type};
