/// FerrisScript front end: tokens, lexer, AST and parser.
///
/// Everything in here is pure: source text goes in, a `Program` plus a list of
/// diagnostics comes out. File access belongs to whoever embeds the pipeline.

pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod types;

pub use diagnostic::{Diagnostic, Span, Stage, ToDiagnostic};
pub use parser::{ParseOutput, SyntaxError, parse};
pub use types::Type;
