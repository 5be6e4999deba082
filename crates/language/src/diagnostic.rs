/// Diagnostic records shared by every stage of the pipeline.

use serde::Serialize;
use std::fmt;

/// The pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lex,
    Parse,
    TypeCheck,
    Runtime,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lex => "lex",
            Stage::Parse => "parse",
            Stage::TypeCheck => "typecheck",
            Stage::Runtime => "runtime",
        };
        f.write_str(name)
    }
}

/// A 1-based source position. Columns count Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The externally visible form of any error: stage, code, message, position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn new(stage: Stage, code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            stage,
            code,
            message: message.into(),
            line: span.map(|s| s.line),
            column: span.map(|s| s.column),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match (self.line, self.column) {
            (Some(line), Some(column)) => Some(Span::new(line, column)),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error[{}]", self.stage, self.code)?;
        if let Some(span) = self.span() {
            write!(f, " at {}", span)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Conversion into the shared diagnostic record.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}
