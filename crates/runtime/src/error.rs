/// Runtime errors. A runtime error aborts the current call only.

use crate::host::PropertyError;
use crate::value::ValueError;
use ferris_language::{Diagnostic, Span, Stage, ToDiagnostic, Type};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("integer overflow in `{0}`")]
    IntegerOverflow(String),
    #[error("integer division by zero")]
    DivisionByZero,
    #[error("cannot apply `{op}` to {left} and {right}")]
    InvalidOperands { op: String, left: Type, right: Type },
    #[error("cannot apply unary `{op}` to {operand}")]
    InvalidOperand { op: String, operand: Type },
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("undefined function `{0}`")]
    UndefinedFunction(String),
    #[error("cannot assign to immutable variable `{0}`")]
    ImmutableAssignment(String),
    #[error("mismatched types: {0}")]
    TypeMismatch(#[from] ValueError),
    #[error("function `{name}` takes {expected} argument(s) but {found} were supplied")]
    ArgumentCount { name: String, expected: usize, found: usize },
    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error("{ty} has no field `{field}`")]
    UnknownField { ty: Type, field: String },
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, span: Option<Span>) -> Self {
        Self { kind, span }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::IntegerOverflow(_) => "E401",
            RuntimeErrorKind::DivisionByZero => "E402",
            RuntimeErrorKind::InvalidOperands { .. } | RuntimeErrorKind::InvalidOperand { .. } => "E403",
            RuntimeErrorKind::UndefinedVariable(_) => "E404",
            RuntimeErrorKind::UndefinedFunction(_) => "E405",
            RuntimeErrorKind::ImmutableAssignment(_) => "E406",
            RuntimeErrorKind::TypeMismatch(_) => "E407",
            RuntimeErrorKind::ArgumentCount { .. } => "E408",
            RuntimeErrorKind::CallDepthExceeded(_) => "E409",
            RuntimeErrorKind::Property(_) => "E410",
            RuntimeErrorKind::UnknownField { .. } => "E411",
            RuntimeErrorKind::InvalidAssignmentTarget => "E412",
        }
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError::new(kind, None)
    }
}

impl From<ValueError> for RuntimeError {
    fn from(err: ValueError) -> Self {
        RuntimeErrorKind::from(err).into()
    }
}

impl From<PropertyError> for RuntimeError {
    fn from(err: PropertyError) -> Self {
        RuntimeErrorKind::from(err).into()
    }
}

impl ToDiagnostic for RuntimeError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(Stage::Runtime, self.code(), self.to_string(), self.span)
    }
}

/// Attach a source position to an error that does not carry one yet.
pub(crate) trait At<T> {
    fn at(self, span: Span) -> Result<T, RuntimeError>;
}

impl<T, E: Into<RuntimeError>> At<T> for Result<T, E> {
    fn at(self, span: Span) -> Result<T, RuntimeError> {
        self.map_err(|e| {
            let mut err = e.into();
            err.span.get_or_insert(span);
            err
        })
    }
}
