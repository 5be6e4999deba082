/// Persistent script state.
///
/// An `Environment` holds the script-level variables of one loaded script.
/// They are initialized once and survive every later call, so a counter
/// incremented in `_process` keeps its value from frame to frame.

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::host::ScriptHost;
use crate::interpreter::Interpreter;
use crate::value::Value;
use ferris_checker::CheckedProgram;
use ferris_language::Type;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub ty: Type,
    pub mutable: bool,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    globals: BTreeMap<String, Binding>,
    config: RuntimeConfig,
}

impl Environment {
    /// Run every script-level initializer in source order.
    pub fn initialize(
        program: &CheckedProgram,
        host: &mut dyn ScriptHost,
        config: &RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        Self::build(program, host, config, None)
    }

    /// Like `initialize`, but a global whose name and type are unchanged
    /// keeps its value from `previous` and its initializer is skipped.
    pub fn initialize_preserving(
        program: &CheckedProgram,
        host: &mut dyn ScriptHost,
        config: &RuntimeConfig,
        previous: &Environment,
    ) -> Result<Self, RuntimeError> {
        Self::build(program, host, config, Some(previous))
    }

    fn build(
        program: &CheckedProgram,
        host: &mut dyn ScriptHost,
        config: &RuntimeConfig,
        previous: Option<&Environment>,
    ) -> Result<Self, RuntimeError> {
        let mut env = Environment { globals: BTreeMap::new(), config: config.clone() };
        let mut preserved = 0;

        for decl in program.globals() {
            let ty = decl.binding_type();
            let kept = previous
                .and_then(|prev| prev.globals.get(&decl.name))
                .filter(|binding| binding.ty == ty)
                .map(|binding| binding.value.clone());

            let value = match kept {
                Some(value) => {
                    preserved += 1;
                    value
                }
                None => Interpreter::new(program.program(), &mut env.globals, &mut *host, &env.config)
                    .eval_initializer(decl)?,
            };
            env.globals.insert(decl.name.clone(), Binding { ty, mutable: decl.mutable, value });
        }

        log::debug!("initialized {} globals ({} preserved)", env.globals.len(), preserved);
        Ok(env)
    }

    /// Call the script function `name` with host-supplied arguments.
    ///
    /// Arguments are checked against the parameter types with the usual
    /// `i32 -> f32` widening. When the call fails and rollback is enabled,
    /// script-level variables are restored to their values before the call.
    pub fn call(
        &mut self,
        program: &CheckedProgram,
        host: &mut dyn ScriptHost,
        name: &str,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let snapshot = self.config.rollback_on_error.then(|| self.globals.clone());
        let result = Interpreter::new(program.program(), &mut self.globals, host, &self.config).call_entry(name, args);

        if let (Err(err), Some(snapshot)) = (&result, snapshot) {
            log::warn!("call to `{}` failed, restoring script state: {}", name, err);
            self.globals = snapshot;
        }
        result
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name).map(|binding| &binding.value)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.globals.get(name)
    }

    /// Script-level variables in name order.
    pub fn globals(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.globals.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeErrorKind;
    use crate::host::PropertyError;
    use crate::value::Vector2;
    use ferris_language::{ToDiagnostic, parse};
    use std::collections::HashMap;

    #[derive(Default)]
    struct TestHost {
        props: HashMap<String, Value>,
        printed: Vec<String>,
    }

    impl ScriptHost for TestHost {
        fn get_property(&self, name: &str) -> Result<Value, PropertyError> {
            self.props.get(name).cloned().ok_or_else(|| PropertyError::NoGetter(name.to_string()))
        }

        fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
            match self.props.get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(PropertyError::NoSetter(name.to_string())),
            }
        }

        fn print(&mut self, line: &str) {
            self.printed.push(line.to_string());
        }
    }

    fn compile(src: &str) -> CheckedProgram {
        let program = match parse(src).into_result() {
            Ok(program) => program,
            Err(errors) => panic!("syntax errors: {:?}", errors),
        };
        match ferris_checker::check(program) {
            Ok(checked) => checked,
            Err(errors) => panic!("type errors: {:?}", errors),
        }
    }

    fn setup(src: &str, host: &mut TestHost) -> (CheckedProgram, Environment) {
        let program = compile(src);
        let env = Environment::initialize(&program, host, &RuntimeConfig::default()).unwrap();
        (program, env)
    }

    #[test]
    fn test_state_persists_across_calls() {
        let mut host = TestHost::default();
        let src = "let mut counter: f32 = 1.0;\nfn _process(delta: f32) { counter += 1.0; }";
        let (program, mut env) = setup(src, &mut host);
        for _ in 0..5 {
            env.call(&program, &mut host, "_process", &[Value::Float(0.016)]).unwrap();
        }
        assert_eq!(env.global("counter"), Some(&Value::Float(6.0)));
    }

    #[test]
    fn test_initializers_run_in_order() {
        let mut host = TestHost::default();
        let (_, env) = setup("let a = 2; let b: f32 = a * 3; let s = \"x\" + \"y\";", &mut host);
        assert_eq!(env.global("b"), Some(&Value::Float(6.0)));
        assert_eq!(env.binding("b").map(|b| b.ty), Some(Type::Float));
        assert_eq!(env.global("s"), Some(&Value::from("xy")));
    }

    #[test]
    fn test_failed_call_rolls_back() {
        let src = "let mut hp: i32 = 10;\nfn hit() { hp -= 3; let zero = 0; hp = hp / zero; }";
        let mut host = TestHost::default();
        let (program, mut env) = setup(src, &mut host);
        match env.call(&program, &mut host, "hit", &[]) {
            Err(err) => assert_eq!(err.kind, RuntimeErrorKind::DivisionByZero),
            Ok(v) => panic!("expected division error, got {:?}", v),
        }
        assert_eq!(env.global("hp"), Some(&Value::Int(10)));

        let config = RuntimeConfig { rollback_on_error: false, ..RuntimeConfig::default() };
        let mut env = Environment::initialize(&program, &mut host, &config).unwrap();
        assert!(env.call(&program, &mut host, "hit", &[]).is_err());
        assert_eq!(env.global("hp"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_call_depth_limit() {
        let mut host = TestHost::default();
        let (program, mut env) = setup("fn r(n: i32) -> i32 { return r(n + 1); }", &mut host);
        let err = env.call(&program, &mut host, "r", &[Value::Int(0)]).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::CallDepthExceeded(64));
    }

    #[test]
    fn test_arguments_are_checked_and_widened() {
        let mut host = TestHost::default();
        let (program, mut env) = setup("fn double(x: f32) -> f32 { return x * 2.0; }", &mut host);
        assert_eq!(env.call(&program, &mut host, "double", &[Value::Int(2)]), Ok(Value::Float(4.0)));

        let err = env.call(&program, &mut host, "double", &[]).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::ArgumentCount { expected: 1, found: 0, .. }));
        let err = env.call(&program, &mut host, "double", &[Value::Bool(true)]).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::TypeMismatch(_)));
        let err = env.call(&program, &mut host, "missing", &[]).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::UndefinedFunction("missing".to_string()));
    }

    #[test]
    fn test_loops_and_shadowing() {
        let src = "fn sum(n: i32) -> i32 {
    let mut total = 0;
    let mut i = 1;
    while i <= n { total += i; i += 1; }
    return total;
}
fn shadow() -> i32 { let x = 1; if true { let x = 2; } return x; }
fn sign(x: f32) -> i32 { if x < 0.0 { return -1; } else if x > 0.0 { return 1; } else { return 0; } }";
        let mut host = TestHost::default();
        let (program, mut env) = setup(src, &mut host);
        assert_eq!(env.call(&program, &mut host, "sum", &[Value::Int(4)]), Ok(Value::Int(10)));
        assert_eq!(env.call(&program, &mut host, "shadow", &[]), Ok(Value::Int(1)));
        assert_eq!(env.call(&program, &mut host, "sign", &[Value::Float(-2.5)]), Ok(Value::Int(-1)));
        assert_eq!(env.call(&program, &mut host, "sign", &[Value::Int(0)]), Ok(Value::Int(0)));
    }

    #[test]
    fn test_short_circuit() {
        let src = "fn boom() -> bool { let zero = 0; return 1 / zero == 0; }
fn safe() -> bool { return false && boom(); }
fn also_safe() -> bool { return true || boom(); }";
        let mut host = TestHost::default();
        let (program, mut env) = setup(src, &mut host);
        assert_eq!(env.call(&program, &mut host, "safe", &[]), Ok(Value::Bool(false)));
        assert_eq!(env.call(&program, &mut host, "also_safe", &[]), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_property_reads_and_nested_writes() {
        let mut host = TestHost::default();
        host.props.insert("position".to_string(), Value::Vector2(Vector2::new(1.0, 2.0)));
        host.props.insert("speed".to_string(), Value::Float(3.0));
        let src = "fn _ready() { self.position.x += 5.0; self.speed = self.speed * 2.0; }";
        let (program, mut env) = setup(src, &mut host);
        env.call(&program, &mut host, "_ready", &[]).unwrap();
        assert_eq!(host.props["position"], Value::Vector2(Vector2::new(6.0, 2.0)));
        assert_eq!(host.props["speed"], Value::Float(6.0));
    }

    #[test]
    fn test_missing_getter_names_field() {
        let mut host = TestHost::default();
        let (program, mut env) = setup("fn _ready() { let h = self.health; }", &mut host);
        let err = env.call(&program, &mut host, "_ready", &[]).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::Property(PropertyError::NoGetter("health".to_string())));
        assert!(err.to_string().contains("health"));
        assert_eq!(err.span.map(|s| s.line), Some(1));
    }

    #[test]
    fn test_print_goes_to_host() {
        let mut host = TestHost::default();
        let (program, mut env) = setup("fn _ready() { print(\"hp\", 3, 1.5, vec2(1.0, 0.0)); }", &mut host);
        env.call(&program, &mut host, "_ready", &[]).unwrap();
        assert_eq!(host.printed, vec!["hp 3 1.5 (1.0, 0.0)".to_string()]);
    }

    #[test]
    fn test_overflow_diagnostic() {
        let mut host = TestHost::default();
        let src = "fn f() -> i32 {\n    let big = 2147483647;\n    return big + 1;\n}";
        let (program, mut env) = setup(src, &mut host);
        let err = env.call(&program, &mut host, "f", &[]).unwrap_err();
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, "E401");
        assert_eq!(diag.line, Some(3));
    }

    #[test]
    fn test_preserving_initialize() {
        let mut host = TestHost::default();
        let (program, mut env) = setup("let mut score: i32 = 0;\nfn add() { score += 5; }", &mut host);
        env.call(&program, &mut host, "add", &[]).unwrap();

        let next = compile("let mut score: i32 = 0;\nlet mut lives = 3;\nfn add() { score += 1; }");
        let env = Environment::initialize_preserving(&next, &mut host, &RuntimeConfig::default(), &env).unwrap();
        assert_eq!(env.global("score"), Some(&Value::Int(5)));
        assert_eq!(env.global("lives"), Some(&Value::Int(3)));

        let retyped = compile("let mut score: f32 = 0.5;");
        let env = Environment::initialize_preserving(&retyped, &mut host, &RuntimeConfig::default(), &env).unwrap();
        assert_eq!(env.global("score"), Some(&Value::Float(0.5)));
    }
}
