/// Type checker.
///
/// Walks the AST in three passes:
/// 1. Registers every function signature (so calls may appear before the callee).
/// 2. Checks script-level `let`s in source order.
/// 3. Checks function bodies with all globals visible.
///
/// A final step follows the calls made by each script-level initializer and
/// rejects any function that would read a global declared later.
///
/// Errors are collected rather than short-circuited. An expression that fails
/// to check is typed `unknown`, which the operator rules accept alongside any
/// operand that could still be valid, so one mistake is reported once.

use crate::builtins::{self, Params};
use crate::symbol::SymbolTable;
use ferris_language::ast::*;
use ferris_language::{Diagnostic, Span, Stage, ToDiagnostic, Type};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeErrorKind {
    #[error("mismatched types: expected {expected}, found {found}")]
    Mismatch { expected: Type, found: Type },
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("`{function}` reads global `{name}` before it is initialized")]
    UninitializedGlobal { function: String, name: String },
    #[error("cannot assign to immutable variable `{0}`")]
    ImmutableAssignment(String),
    #[error("undefined function `{0}`")]
    UndefinedFunction(String),
    #[error("function `{name}` takes {expected} argument(s) but {found} were supplied")]
    ArgumentCount { name: String, expected: usize, found: usize },
    #[error("cannot apply `{op}` to {left} and {right}")]
    InvalidOperands { op: BinaryOp, left: Type, right: Type },
    #[error("cannot apply unary `{op}` to {operand}")]
    InvalidUnaryOperand { op: UnaryOp, operand: Type },
    #[error("type {ty} has no field `{field}`")]
    UnknownField { ty: Type, field: String },
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("`{0}` is already defined")]
    Duplicate(String),
    #[error("`{0}` is a built-in function and cannot be redefined")]
    BuiltinRedefinition(String),
    #[error("function `{name}` must return a value of type {ty} on every path")]
    MissingReturn { name: String, ty: Type },
    #[error("`{0}` cannot have type void")]
    VoidBinding(String),
    #[error("argument {index} of `{function}` has type void")]
    VoidArgument { function: String, index: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub span: Span,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            TypeErrorKind::Mismatch { .. } => "E301",
            TypeErrorKind::UndefinedVariable(_) | TypeErrorKind::UninitializedGlobal { .. } => "E302",
            TypeErrorKind::ImmutableAssignment(_) => "E303",
            TypeErrorKind::UndefinedFunction(_) => "E304",
            TypeErrorKind::ArgumentCount { .. } => "E305",
            TypeErrorKind::InvalidOperands { .. } => "E306",
            TypeErrorKind::InvalidUnaryOperand { .. } => "E307",
            TypeErrorKind::UnknownField { .. } => "E308",
            TypeErrorKind::UnknownType(_) => "E309",
            TypeErrorKind::Duplicate(_) => "E310",
            TypeErrorKind::BuiltinRedefinition(_) => "E311",
            TypeErrorKind::MissingReturn { .. } => "E312",
            TypeErrorKind::VoidBinding(_) | TypeErrorKind::VoidArgument { .. } => "E313",
        }
    }
}

impl ToDiagnostic for TypeError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(Stage::TypeCheck, self.code(), self.to_string(), Some(self.span))
    }
}

/// A program that passed the checker. Every expression carries its type and
/// every declaration its resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedProgram {
    program: Program,
}

impl CheckedProgram {
    pub fn program(&self) -> &Program {
        &self.program
    }

}

impl Deref for CheckedProgram {
    type Target = Program;

    fn deref(&self) -> &Program {
        &self.program
    }
}

/// Check a parsed program, annotating it in place.
pub fn check(mut program: Program) -> Result<CheckedProgram, Vec<TypeError>> {
    let mut checker = Checker::new();
    checker.check_program(&mut program);
    log::debug!(
        "type checked {} items: {} functions, {} errors",
        program.items.len(),
        checker.functions.len(),
        checker.errors.len()
    );
    if checker.errors.is_empty() {
        Ok(CheckedProgram { program })
    } else {
        Err(checker.errors)
    }
}

// --- Operator tables ---

/// Result type of `left op right`, or `None` when the operands are rejected.
pub fn binary_result_type(op: BinaryOp, left: Type, right: Type) -> Option<Type> {
    use Type::*;

    if left == Unknown || right == Unknown {
        // The host decides the unknown side at runtime; the known side must
        // still be something the operator can take.
        let known = if left == Unknown { right } else { left };
        return match op {
            _ if op.is_arithmetic() => (!matches!(known, Bool | Void | Node)).then_some(Unknown),
            _ if op.is_logical() => matches!(known, Bool | Unknown).then_some(Bool),
            _ if op.is_ordering() => (known.is_numeric() || known == Unknown).then_some(Bool),
            _ => (known != Void).then_some(Bool),
        };
    }

    let numeric = left.is_numeric() && right.is_numeric();
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => match (left, right) {
            (Int, Int) => Some(Int),
            _ if numeric => Some(Float),
            (Vector2, Vector2) if matches!(op, BinaryOp::Add | BinaryOp::Sub) => Some(Vector2),
            (Vector2, n) if n.is_numeric() && matches!(op, BinaryOp::Mul | BinaryOp::Div) => Some(Vector2),
            (n, Vector2) if n.is_numeric() && op == BinaryOp::Mul => Some(Vector2),
            (String, String) if op == BinaryOp::Add => Some(String),
            _ => None,
        },
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => numeric.then_some(Bool),
        BinaryOp::Eq | BinaryOp::Ne => (numeric || (left == right && left != Void)).then_some(Bool),
        BinaryOp::And | BinaryOp::Or => (left == Bool && right == Bool).then_some(Bool),
    }
}

pub fn unary_result_type(op: UnaryOp, operand: Type) -> Option<Type> {
    match (op, operand) {
        (UnaryOp::Neg, Type::Int | Type::Float | Type::Vector2 | Type::Unknown) => Some(operand),
        (UnaryOp::Not, Type::Bool | Type::Unknown) => Some(Type::Bool),
        _ => None,
    }
}

// --- Checker ---

#[derive(Debug, Clone)]
struct Signature {
    params: Vec<Type>,
    ret: Type,
}

/// Script-level names one body refers to directly.
#[derive(Debug, Default)]
struct Uses {
    globals: BTreeSet<String>,
    calls: Vec<(String, Span)>,
}

struct Checker {
    symbols: SymbolTable,
    functions: HashMap<String, Signature>,
    current_return: Type,
    uses: Uses,
    function_uses: HashMap<String, Uses>,
    errors: Vec<TypeError>,
}

impl Checker {
    fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            functions: HashMap::new(),
            current_return: Type::Void,
            uses: Uses::default(),
            function_uses: HashMap::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, kind: TypeErrorKind, span: Span) {
        log::trace!("type error at {}: {}", span, kind);
        self.errors.push(TypeError::new(kind, span));
    }

    fn check_program(&mut self, program: &mut Program) {
        for item in program.items.iter_mut() {
            if let Item::Function(func) = item {
                self.register_function(func);
            }
        }
        let mut declared_at = HashMap::new();
        let mut initializers = Vec::new();
        for item in program.items.iter_mut() {
            if let Item::Global(decl) = item {
                self.uses = Uses::default();
                self.check_let(decl, true);
                let index = initializers.len();
                declared_at.entry(decl.name.clone()).or_insert(index);
                initializers.push((index, std::mem::take(&mut self.uses.calls)));
            }
        }
        for item in program.items.iter_mut() {
            if let Item::Function(func) = item {
                self.check_function(func);
            }
        }
        self.check_initialization_order(&initializers, &declared_at);
    }

    /// Initializers run in declaration order, so a function called from one
    /// may only reach globals declared before it.
    fn check_initialization_order(
        &mut self,
        initializers: &[(usize, Vec<(String, Span)>)],
        declared_at: &HashMap<String, usize>,
    ) {
        let mut found = Vec::new();
        for (index, calls) in initializers {
            for (callee, span) in calls {
                for name in self.reachable_globals(callee) {
                    if declared_at.get(name).is_some_and(|declared| declared >= index) {
                        let kind = TypeErrorKind::UninitializedGlobal { function: callee.clone(), name: name.to_string() };
                        found.push(TypeError::new(kind, *span));
                    }
                }
            }
        }
        for err in found {
            self.error(err.kind, err.span);
        }
    }

    /// Every global read or written by `function` or anything it calls.
    fn reachable_globals(&self, function: &str) -> BTreeSet<&str> {
        let mut globals = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut pending = vec![function];
        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(uses) = self.function_uses.get(name) {
                globals.extend(uses.globals.iter().map(String::as_str));
                pending.extend(uses.calls.iter().map(|(callee, _)| callee.as_str()));
            }
        }
        globals
    }

    fn resolve_type(&mut self, name: &mut TypeName) -> Type {
        let ty = match Type::from_name(&name.name) {
            Some(ty) => ty,
            None => {
                self.error(TypeErrorKind::UnknownType(name.name.clone()), name.span);
                Type::Unknown
            }
        };
        name.resolved = Some(ty);
        ty
    }

    fn register_function(&mut self, func: &mut FunctionDecl) {
        let mut params = Vec::with_capacity(func.params.len());
        for param in func.params.iter_mut() {
            let ty = self.resolve_type(&mut param.ty);
            if ty == Type::Void {
                self.error(TypeErrorKind::VoidBinding(param.name.clone()), param.span);
            }
            params.push(ty);
        }
        let ret = self.resolve_type(&mut func.return_type);

        if builtins::is_builtin(&func.name) {
            self.error(TypeErrorKind::BuiltinRedefinition(func.name.clone()), func.span);
        } else if self.functions.contains_key(&func.name) {
            self.error(TypeErrorKind::Duplicate(func.name.clone()), func.span);
        } else {
            self.functions.insert(func.name.clone(), Signature { params, ret });
        }
    }

    fn check_function(&mut self, func: &mut FunctionDecl) {
        self.uses = Uses::default();
        self.symbols.enter_function();
        for param in &func.params {
            if self.symbols.resolve(&param.name).is_some_and(|s| s.scope_depth == self.symbols.depth()) {
                self.error(TypeErrorKind::Duplicate(param.name.clone()), param.span);
            }
            self.symbols.define(&param.name, param.ty.ty(), false);
        }

        self.current_return = func.return_type.ty();
        for stmt in func.body.statements.iter_mut() {
            self.check_stmt(stmt);
        }

        let ret = self.current_return;
        if ret != Type::Void && ret != Type::Unknown && !block_returns(&func.body) {
            self.error(TypeErrorKind::MissingReturn { name: func.name.clone(), ty: ret }, func.span);
        }
        self.current_return = Type::Void;
        self.symbols.exit_function();
        let uses = std::mem::take(&mut self.uses);
        self.function_uses.entry(func.name.clone()).or_insert(uses);
    }

    fn check_block(&mut self, block: &mut Block) {
        self.symbols.enter_scope();
        for stmt in block.statements.iter_mut() {
            self.check_stmt(stmt);
        }
        self.symbols.exit_scope();
    }

    // --- Statements ---

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Let(decl) => self.check_let(decl, false),
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::If(if_stmt) => {
                self.check_condition(&mut if_stmt.condition);
                self.check_block(&mut if_stmt.then_block);
                if let Some(else_block) = &mut if_stmt.else_block {
                    self.check_block(else_block);
                }
            }
            Stmt::While(while_stmt) => {
                self.check_condition(&mut while_stmt.condition);
                self.check_block(&mut while_stmt.body);
            }
            Stmt::Return(ret) => {
                let expected = self.current_return;
                let (found, span) = match &mut ret.value {
                    Some(value) => (self.check_expr(value), value.span),
                    None => (Type::Void, ret.span),
                };
                if !expected.accepts(found) {
                    self.error(TypeErrorKind::Mismatch { expected, found }, span);
                }
            }
            Stmt::Expr(expr) => {
                self.check_expr(expr);
            }
        }
    }

    fn check_let(&mut self, decl: &mut LetDecl, global: bool) {
        let found = self.check_expr(&mut decl.value);
        let ty = match &mut decl.type_hint {
            Some(hint) => {
                let declared = self.resolve_type(hint);
                if declared == Type::Void {
                    self.error(TypeErrorKind::VoidBinding(decl.name.clone()), hint.span);
                    Type::Unknown
                } else {
                    if !declared.accepts(found) {
                        self.error(TypeErrorKind::Mismatch { expected: declared, found }, decl.value.span);
                    }
                    declared
                }
            }
            None if found == Type::Void => {
                self.error(TypeErrorKind::VoidBinding(decl.name.clone()), decl.value.span);
                Type::Unknown
            }
            None => found,
        };
        decl.resolved = Some(ty);

        if global && self.symbols.global(&decl.name).is_some() {
            self.error(TypeErrorKind::Duplicate(decl.name.clone()), decl.span);
        }
        self.symbols.define(&decl.name, ty, decl.mutable);
    }

    fn check_assign(&mut self, assign: &mut Assignment) {
        let target = self.check_expr(&mut assign.target);
        self.check_mutability(&assign.target);
        let value = self.check_expr(&mut assign.value);

        let result = match assign.op {
            Some(op) => match binary_result_type(op, target, value) {
                Some(ty) => ty,
                None => {
                    self.error(TypeErrorKind::InvalidOperands { op, left: target, right: value }, assign.span);
                    return;
                }
            },
            None => value,
        };
        if !target.accepts(result) {
            self.error(TypeErrorKind::Mismatch { expected: target, found: result }, assign.value.span);
        }
    }

    /// Writes through `self` are always allowed; the host decides at runtime.
    fn check_mutability(&mut self, target: &Expr) {
        let mut root = target;
        while let ExprKind::FieldAccess { object, .. } = &root.kind {
            root = &**object;
        }
        if let ExprKind::Identifier(name) = &root.kind {
            if self.symbols.resolve(name).is_some_and(|s| !s.mutable) {
                self.error(TypeErrorKind::ImmutableAssignment(name.clone()), target.span);
            }
        }
    }

    fn check_condition(&mut self, cond: &mut Expr) {
        let found = self.check_expr(cond);
        if !Type::Bool.accepts(found) {
            self.error(TypeErrorKind::Mismatch { expected: Type::Bool, found }, cond.span);
        }
    }

    // --- Expressions ---

    fn check_expr(&mut self, expr: &mut Expr) -> Type {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::Literal(lit) => lit.ty(),
            ExprKind::Identifier(name) => match self.symbols.resolve(name).map(|sym| (sym.ty, sym.scope_depth)) {
                Some((ty, depth)) => {
                    if depth == 0 {
                        self.uses.globals.insert(name.clone());
                    }
                    ty
                }
                None => {
                    self.error(TypeErrorKind::UndefinedVariable(name.clone()), span);
                    Type::Unknown
                }
            },
            ExprKind::SelfRef => Type::Node,
            ExprKind::Unary { op, operand } => {
                let op = *op;
                let operand = self.check_expr(operand);
                unary_result_type(op, operand).unwrap_or_else(|| {
                    self.error(TypeErrorKind::InvalidUnaryOperand { op, operand }, span);
                    Type::Unknown
                })
            }
            ExprKind::Binary { op, left, right } => {
                let op = *op;
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                binary_result_type(op, left, right).unwrap_or_else(|| {
                    self.error(TypeErrorKind::InvalidOperands { op, left, right }, span);
                    Type::Unknown
                })
            }
            ExprKind::Call { name, args } => self.check_call(name, args, span),
            ExprKind::FieldAccess { object, field } => {
                let ty = self.check_expr(object);
                ty.field(field).unwrap_or_else(|| {
                    self.error(TypeErrorKind::UnknownField { ty, field: field.clone() }, span);
                    Type::Unknown
                })
            }
        };
        expr.ty = Some(ty);
        ty
    }

    fn check_call(&mut self, name: &str, args: &mut [Expr], span: Span) -> Type {
        let arg_types: Vec<Type> = args.iter_mut().map(|arg| self.check_expr(arg)).collect();

        let (params, ret) = if let Some(sig) = self.functions.get(name) {
            self.uses.calls.push((name.to_string(), span));
            (sig.params.clone(), sig.ret)
        } else if let Some(builtin) = builtins::lookup(name) {
            match builtin.params {
                Params::Fixed(params) => (params.to_vec(), builtin.ret),
                Params::Variadic => {
                    for (i, ty) in arg_types.iter().enumerate() {
                        if *ty == Type::Void {
                            let kind = TypeErrorKind::VoidArgument { function: name.to_string(), index: i + 1 };
                            self.error(kind, args[i].span);
                        }
                    }
                    return builtin.ret;
                }
            }
        } else {
            self.error(TypeErrorKind::UndefinedFunction(name.to_string()), span);
            return Type::Unknown;
        };

        if params.len() != arg_types.len() {
            let kind = TypeErrorKind::ArgumentCount {
                name: name.to_string(),
                expected: params.len(),
                found: arg_types.len(),
            };
            self.error(kind, span);
            return ret;
        }
        for ((expected, found), arg) in params.iter().zip(&arg_types).zip(args.iter()) {
            if !expected.accepts(*found) {
                self.error(TypeErrorKind::Mismatch { expected: *expected, found: *found }, arg.span);
            }
        }
        ret
    }
}

// --- Return-path analysis ---

/// Whether every path through `block` ends in a `return`.
fn block_returns(block: &Block) -> bool {
    block.statements.iter().any(stmt_returns)
}

fn stmt_returns(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::If(if_stmt) => {
            block_returns(&if_stmt.then_block) && if_stmt.else_block.as_ref().is_some_and(block_returns)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferris_language::parse;

    fn check_src(src: &str) -> Result<CheckedProgram, Vec<TypeError>> {
        let program = match parse(src).into_result() {
            Ok(program) => program,
            Err(errors) => panic!("syntax errors in test source: {:?}", errors),
        };
        check(program)
    }

    fn errors(src: &str) -> Vec<TypeError> {
        match check_src(src) {
            Ok(_) => panic!("expected type errors for {:?}", src),
            Err(errors) => errors,
        }
    }

    #[test]
    fn test_mismatch_names_both_types() {
        let errs = errors("let x: i32 = true;");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, TypeErrorKind::Mismatch { expected: Type::Int, found: Type::Bool });
        let msg = errs[0].to_string();
        assert!(msg.contains("i32") && msg.contains("bool"), "{}", msg);
        assert_eq!(errs[0].code(), "E301");
    }

    #[test]
    fn test_int_widens_to_float() {
        let checked = check_src("let x: f32 = 1;").unwrap();
        assert_eq!(checked.globals().next().map(|g| g.binding_type()), Some(Type::Float));
    }

    #[test]
    fn test_float_does_not_narrow() {
        let errs = errors("let x: i32 = 1.5;");
        assert_eq!(errs[0].kind, TypeErrorKind::Mismatch { expected: Type::Int, found: Type::Float });
    }

    #[test]
    fn test_immutable_assignment_rejected() {
        let errs = errors("fn _ready() { let x = 5; x = 6; }");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, TypeErrorKind::ImmutableAssignment("x".to_string()));
    }

    #[test]
    fn test_mutable_and_self_assignment_allowed() {
        let src = "let mut speed: f32 = 1.0;
fn _process(delta: f32) {
    speed += delta;
    self.position.x += speed;
    self.visible = true;
}";
        assert!(check_src(src).is_ok());
    }

    #[test]
    fn test_field_of_immutable_vector_rejected() {
        let errs = errors("fn f() { let v = vec2(1.0, 2.0); v.x = 3.0; }");
        assert_eq!(errs[0].kind, TypeErrorKind::ImmutableAssignment("v".to_string()));
    }

    #[test]
    fn test_collects_multiple_errors() {
        let src = "let a: i32 = true;
fn f() { let b: bool = 1; missing(); }";
        let errs = errors(src);
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[2].kind, TypeErrorKind::UndefinedFunction("missing".to_string()));
    }

    #[test]
    fn test_function_locals_are_isolated() {
        let src = "fn a() { let secret = 1; }
fn b() -> i32 { return secret; }";
        let errs = errors(src);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, TypeErrorKind::UndefinedVariable("secret".to_string()));
    }

    #[test]
    fn test_globals_visible_in_order() {
        assert!(check_src("let a = 1; let b = a + 1; fn f() -> i32 { return b; }").is_ok());
        let errs = errors("let b = a + 1; let a = 1;");
        assert_eq!(errs[0].kind, TypeErrorKind::UndefinedVariable("a".to_string()));
    }

    #[test]
    fn test_initializer_call_reads_later_global() {
        let errs = errors("let a = f();\nlet b: i32 = 1;\nfn f() -> i32 { return b; }");
        assert_eq!(errs.len(), 1);
        assert_eq!(
            errs[0].kind,
            TypeErrorKind::UninitializedGlobal { function: "f".to_string(), name: "b".to_string() }
        );
        assert_eq!(errs[0].code(), "E302");
        assert_eq!(errs[0].span.line, 1);

        // through an intermediate call, and the global being initialized itself
        let errs = errors("let a = g();\nfn g() -> i32 { return h(); }\nfn h() -> i32 { return a; }");
        assert_eq!(
            errs[0].kind,
            TypeErrorKind::UninitializedGlobal { function: "g".to_string(), name: "a".to_string() }
        );

        // earlier globals are fine, and functions never called at load may use anything
        let ok = "let b: i32 = 1;\nlet a = f();\nlet c = 2;\nfn f() -> i32 { return b; }\nfn g() -> i32 { return c; }";
        assert!(check_src(ok).is_ok());
    }

    #[test]
    fn test_unknown_operand_still_checks_known_side() {
        let errs = errors("fn f() { let ok = self.flag && 5; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0].kind, TypeErrorKind::InvalidOperands { op: BinaryOp::And, .. }));

        let errs = errors("fn f() { let ok = self.speed < true; }");
        assert!(matches!(errs[0].kind, TypeErrorKind::InvalidOperands { op: BinaryOp::Lt, .. }));

        let src = "fn f() { let a = self.flag && true; let b = self.speed > 1.0; let c = self.hp + 1; }";
        assert!(check_src(src).is_ok());
    }

    #[test]
    fn test_functions_callable_before_definition() {
        assert!(check_src("fn a() -> f32 { return b(2); } fn b(x: f32) -> f32 { return x * 2.0; }").is_ok());
    }

    #[test]
    fn test_missing_return() {
        let errs = errors("fn f(x: i32) -> i32 { if x > 0 { return 1; } }");
        assert_eq!(errs[0].kind, TypeErrorKind::MissingReturn { name: "f".to_string(), ty: Type::Int });

        let ok = "fn g(x: i32) -> i32 { if x > 0 { return 1; } else { return 2; } }";
        assert!(check_src(ok).is_ok());
    }

    #[test]
    fn test_return_value_checked() {
        let errs = errors("fn f() -> bool { return 1; }");
        assert_eq!(errs[0].kind, TypeErrorKind::Mismatch { expected: Type::Bool, found: Type::Int });
        let errs = errors("fn g() { return 1; }");
        assert_eq!(errs[0].kind, TypeErrorKind::Mismatch { expected: Type::Void, found: Type::Int });
    }

    #[test]
    fn test_condition_must_be_bool() {
        let errs = errors("fn f() { while 1 { } }");
        assert_eq!(errs[0].kind, TypeErrorKind::Mismatch { expected: Type::Bool, found: Type::Int });
    }

    #[test]
    fn test_call_arity_and_arguments() {
        let errs = errors("fn f() { let x = clamp(1.0, 2.0); }");
        assert!(matches!(errs[0].kind, TypeErrorKind::ArgumentCount { expected: 3, found: 2, .. }));
        let errs = errors("fn f() { let n = len(5); }");
        assert_eq!(errs[0].kind, TypeErrorKind::Mismatch { expected: Type::String, found: Type::Int });
    }

    #[test]
    fn test_builtin_redefinition_and_duplicates() {
        let errs = errors("fn print() {} fn a() {} fn a() {}");
        assert_eq!(errs[0].kind, TypeErrorKind::BuiltinRedefinition("print".to_string()));
        assert_eq!(errs[1].kind, TypeErrorKind::Duplicate("a".to_string()));
    }

    #[test]
    fn test_unknown_type_and_void_binding() {
        let errs = errors("let x: Vec3 = 1; fn f() { let y = print(1); }");
        assert_eq!(errs[0].kind, TypeErrorKind::UnknownType("Vec3".to_string()));
        assert_eq!(errs[1].kind, TypeErrorKind::VoidBinding("y".to_string()));
    }

    #[test]
    fn test_field_access() {
        let checked = check_src("let v = vec2(1.0, 2.0); let x = v.x;").unwrap();
        assert_eq!(checked.globals().nth(1).map(|g| g.binding_type()), Some(Type::Float));
        let errs = errors("let v = vec2(1.0, 2.0); let z = v.z;");
        assert!(matches!(errs[0].kind, TypeErrorKind::UnknownField { ty: Type::Vector2, .. }));
    }

    #[test]
    fn test_operator_table() {
        use BinaryOp::*;
        assert_eq!(binary_result_type(Add, Type::Int, Type::Int), Some(Type::Int));
        assert_eq!(binary_result_type(Div, Type::Int, Type::Float), Some(Type::Float));
        assert_eq!(binary_result_type(Sub, Type::Vector2, Type::Vector2), Some(Type::Vector2));
        assert_eq!(binary_result_type(Mul, Type::Float, Type::Vector2), Some(Type::Vector2));
        assert_eq!(binary_result_type(Div, Type::Float, Type::Vector2), None);
        assert_eq!(binary_result_type(Add, Type::String, Type::String), Some(Type::String));
        assert_eq!(binary_result_type(Sub, Type::String, Type::String), None);
        assert_eq!(binary_result_type(Lt, Type::Int, Type::Float), Some(Type::Bool));
        assert_eq!(binary_result_type(Eq, Type::Bool, Type::Bool), Some(Type::Bool));
        assert_eq!(binary_result_type(Eq, Type::Bool, Type::Int), None);
        assert_eq!(binary_result_type(And, Type::Bool, Type::Int), None);
        assert_eq!(binary_result_type(Add, Type::Unknown, Type::Float), Some(Type::Unknown));
        assert_eq!(binary_result_type(Add, Type::Unknown, Type::Bool), None);
        assert_eq!(unary_result_type(UnaryOp::Neg, Type::Vector2), Some(Type::Vector2));
        assert_eq!(unary_result_type(UnaryOp::Not, Type::Int), None);
    }

    #[test]
    fn test_annotates_expressions() {
        let checked = check_src("let x = 1 + 2.0;").unwrap();
        let decl = checked.globals().next().unwrap();
        assert_eq!(decl.value.ty, Some(Type::Float));
        match &decl.value.kind {
            ExprKind::Binary { left, .. } => assert_eq!(left.ty, Some(Type::Int)),
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_diagnostic_stage() {
        let errs = errors("let x: bool = 1;");
        let diag = errs[0].to_diagnostic();
        assert_eq!(diag.stage, Stage::TypeCheck);
        assert_eq!(diag.line, Some(1));
    }
}
