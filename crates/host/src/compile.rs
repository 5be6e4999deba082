/// Source text to checked program, collecting every diagnostic on the way.

use crate::error::CompileError;
use ferris_checker::CheckedProgram;
use ferris_language::{ToDiagnostic, parse};

/// Parse and type-check `source`.
///
/// Syntax errors stop the pipeline before checking, since the checker would
/// only report follow-on noise from a partial tree.
pub fn compile(source: &str) -> Result<CheckedProgram, CompileError> {
    let output = parse(source);
    if !output.is_ok() {
        log::debug!("compile stopped after parsing: {} syntax errors", output.errors.len());
        return Err(CompileError::new(output.diagnostics()));
    }
    ferris_checker::check(output.program)
        .map_err(|errors| CompileError::new(errors.iter().map(ToDiagnostic::to_diagnostic).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferris_language::Stage;

    #[test]
    fn test_compile_ok() {
        let program = compile("let mut t: f32 = 0.0;\nfn _process(delta: f32) { t += delta; }").unwrap();
        assert!(program.function("_process").is_some());
    }

    #[test]
    fn test_missing_semicolon_reports_once() {
        let err = compile("fn test() { let x = 5 let y = 10; }").unwrap_err();
        assert_eq!(err.diagnostics.len(), 1);
        assert_eq!(err.diagnostics[0].stage, Stage::Parse);
    }

    #[test]
    fn test_type_errors_are_collected() {
        let err = compile("let a: i32 = true;\nlet b: bool = 1;").unwrap_err();
        assert_eq!(err.diagnostics.len(), 2);
        assert!(err.diagnostics.iter().all(|d| d.stage == Stage::TypeCheck));
        assert!(err.to_string().contains("and 1 more"));
    }

    #[test]
    fn test_lex_error_stage() {
        let err = compile("let café = 1;").unwrap_err();
        assert_eq!(err.diagnostics[0].stage, Stage::Lex);
    }
}
