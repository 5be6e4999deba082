/// Ferris runtime: a tree-walking interpreter over checked programs.
///
/// Script-level variables live in an `Environment` that persists between
/// calls. Everything the script knows about its node goes through the
/// `ScriptHost` capability trait.

pub mod builtins;
pub mod config;
pub mod environment;
pub mod error;
pub mod host;
mod interpreter;
pub mod ops;
pub mod value;

pub use config::RuntimeConfig;
pub use environment::{Binding, Environment};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use host::{PropertyError, ScriptHost};
pub use value::{NodeRef, Value, ValueError, Vector2};
