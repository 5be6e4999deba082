/// Errors from loading and reloading scripts.

use ferris_language::Diagnostic;
use ferris_language::ToDiagnostic;
use ferris_runtime::RuntimeError;

/// Every diagnostic of one failed compile attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", summary(.diagnostics))]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

fn summary(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "compilation failed".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

impl CompileError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// A script-level initializer failed.
    #[error("initialization failed: {0}")]
    Initialize(#[from] RuntimeError),
}

impl LoadError {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            LoadError::Compile(err) => err.diagnostics.clone(),
            LoadError::Initialize(err) => vec![err.to_diagnostic()],
        }
    }
}
