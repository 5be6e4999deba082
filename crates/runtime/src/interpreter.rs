/// Tree-walking evaluation of checked programs.
///
/// An `Interpreter` lives for one call from the host. Script-level variables
/// are borrowed from the `Environment`; locals live in per-call frames.

use crate::builtins;
use crate::config::RuntimeConfig;
use crate::environment::Binding;
use crate::error::{At, RuntimeError, RuntimeErrorKind};
use crate::host::ScriptHost;
use crate::ops;
use crate::value::{Value, ValueError};
use ferris_language::{Span, Type};
use ferris_language::ast::*;
use std::collections::{BTreeMap, HashMap};

/// Control flow signal for statement execution.
enum Flow {
    Normal,
    Return(Value),
}

/// Locals of one active function call, innermost block last.
struct Frame {
    scopes: Vec<HashMap<String, Binding>>,
}

pub(crate) struct Interpreter<'a> {
    program: &'a Program,
    globals: &'a mut BTreeMap<String, Binding>,
    host: &'a mut dyn ScriptHost,
    config: &'a RuntimeConfig,
    frames: Vec<Frame>,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        program: &'a Program,
        globals: &'a mut BTreeMap<String, Binding>,
        host: &'a mut dyn ScriptHost,
        config: &'a RuntimeConfig,
    ) -> Self {
        Self { program, globals, host, config, frames: Vec::new() }
    }

    /// Run a script-level initializer.
    pub(crate) fn eval_initializer(&mut self, decl: &LetDecl) -> Result<Value, RuntimeError> {
        let value = self.eval(&decl.value)?;
        value.coerce(decl.binding_type()).at(decl.value.span)
    }

    /// Call a script function on behalf of the host.
    pub(crate) fn call_entry(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let program = self.program;
        let func = program
            .function(name)
            .ok_or_else(|| RuntimeError::from(RuntimeErrorKind::UndefinedFunction(name.to_string())))?;
        self.invoke(func, args.to_vec(), None)
    }

    fn invoke(&mut self, func: &FunctionDecl, args: Vec<Value>, call_site: Option<Span>) -> Result<Value, RuntimeError> {
        if args.len() != func.params.len() {
            let kind = RuntimeErrorKind::ArgumentCount {
                name: func.name.clone(),
                expected: func.params.len(),
                found: args.len(),
            };
            return Err(RuntimeError::new(kind, call_site));
        }
        if self.frames.len() >= self.config.max_call_depth {
            let kind = RuntimeErrorKind::CallDepthExceeded(self.config.max_call_depth);
            return Err(RuntimeError::new(kind, call_site));
        }

        let mut locals = HashMap::new();
        for (param, arg) in func.params.iter().zip(args) {
            let ty = param.ty.ty();
            let value = arg.coerce(ty).map_err(|e| RuntimeError::new(e.into(), call_site.or(Some(param.span))))?;
            locals.insert(param.name.clone(), Binding { ty, mutable: false, value });
        }

        log::trace!("enter `{}` at depth {}", func.name, self.frames.len() + 1);
        self.frames.push(Frame { scopes: vec![locals] });
        let flow = self.exec_statements(&func.body.statements);
        self.frames.pop();

        let value = match flow? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Void,
        };
        value.coerce(func.return_type.ty()).at(func.span)
    }

    // --- Scopes ---

    fn lookup(&self, name: &str) -> Option<&Binding> {
        if let Some(frame) = self.frames.last() {
            if let Some(binding) = frame.scopes.iter().rev().find_map(|scope| scope.get(name)) {
                return Some(binding);
            }
        }
        self.globals.get(name)
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Binding> {
        if let Some(frame) = self.frames.last_mut() {
            for scope in frame.scopes.iter_mut().rev() {
                if let Some(binding) = scope.get_mut(name) {
                    return Some(binding);
                }
            }
        }
        self.globals.get_mut(name)
    }

    fn declare(&mut self, name: &str, binding: Binding) {
        match self.frames.last_mut().and_then(|frame| frame.scopes.last_mut()) {
            Some(scope) => {
                scope.insert(name.to_string(), binding);
            }
            None => {
                self.globals.insert(name.to_string(), binding);
            }
        }
    }

    // --- Statements ---

    fn exec_statements(&mut self, statements: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in statements {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_block(&mut self, block: &Block) -> Result<Flow, RuntimeError> {
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.push(HashMap::new());
        }
        let flow = self.exec_statements(&block.statements);
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.pop();
        }
        flow
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Let(decl) => {
                let ty = decl.binding_type();
                let value = self.eval(&decl.value)?.coerce(ty).at(decl.value.span)?;
                self.declare(&decl.name, Binding { ty, mutable: decl.mutable, value });
                Ok(Flow::Normal)
            }
            Stmt::Assign(assign) => {
                let value = match assign.op {
                    Some(op) => {
                        let current = self.eval(&assign.target)?;
                        let rhs = self.eval(&assign.value)?;
                        ops::binary(op, current, rhs).at(assign.span)?
                    }
                    None => self.eval(&assign.value)?,
                };
                self.assign(&assign.target, value)?;
                Ok(Flow::Normal)
            }
            Stmt::If(if_stmt) => {
                if self.eval_condition(&if_stmt.condition)? {
                    self.exec_block(&if_stmt.then_block)
                } else if let Some(else_block) = &if_stmt.else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(while_stmt) => {
                while self.eval_condition(&while_stmt.condition)? {
                    if let Flow::Return(value) = self.exec_block(&while_stmt.body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Store `value` into a place expression. Field writes below `self` read
    /// the outer value, update the field and write the outer value back.
    fn assign(&mut self, target: &Expr, value: Value) -> Result<(), RuntimeError> {
        let span = target.span;
        match &target.kind {
            ExprKind::Identifier(name) => {
                let binding = self
                    .lookup_mut(name)
                    .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.clone()))
                    .at(span)?;
                if !binding.mutable {
                    return Err(RuntimeError::new(RuntimeErrorKind::ImmutableAssignment(name.clone()), Some(span)));
                }
                binding.value = value.coerce(binding.ty).at(span)?;
                Ok(())
            }
            ExprKind::FieldAccess { object, field } => {
                if matches!(object.kind, ExprKind::SelfRef) {
                    return self.host.set_property(field, value).at(span);
                }
                let mut base = self.eval(object)?;
                if base.field(field).is_none() {
                    let kind = RuntimeErrorKind::UnknownField { ty: base.ty(), field: field.clone() };
                    return Err(RuntimeError::new(kind, Some(span)));
                }
                if !base.set_field(field, &value) {
                    let kind = RuntimeErrorKind::InvalidOperands {
                        op: "=".to_string(),
                        left: base.ty(),
                        right: value.ty(),
                    };
                    return Err(RuntimeError::new(kind, Some(span)));
                }
                self.assign(object, base)
            }
            _ => Err(RuntimeError::new(RuntimeErrorKind::InvalidAssignmentTarget, Some(span))),
        }
    }

    // --- Expressions ---

    fn eval_condition(&mut self, expr: &Expr) -> Result<bool, RuntimeError> {
        let value = self.eval(expr)?;
        value.as_bool().ok_or_else(|| {
            let kind = RuntimeErrorKind::TypeMismatch(ValueError { expected: Type::Bool, found: value.ty() });
            RuntimeError::new(kind, Some(expr.span))
        })
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(v) => Value::Float(*v),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Str(s) => Value::String(s.clone()),
            }),
            ExprKind::Identifier(name) => self
                .lookup(name)
                .map(|binding| binding.value.clone())
                .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.clone()))
                .at(span),
            ExprKind::SelfRef => Ok(Value::Node(self.host.node())),
            ExprKind::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                ops::unary(*op, operand).at(span)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                // `false && _` and `true || _` never evaluate the right side.
                if op.is_logical() && left.as_bool() == Some(*op == BinaryOp::Or) {
                    return Ok(left);
                }
                let right = self.eval(right)?;
                ops::binary(*op, left, right).at(span)
            }
            ExprKind::Call { name, args } => {
                let args = args.iter().map(|arg| self.eval(arg)).collect::<Result<Vec<_>, _>>()?;
                self.call(name, args, span)
            }
            ExprKind::FieldAccess { object, field } => {
                if matches!(object.kind, ExprKind::SelfRef) {
                    return self.host.get_property(field).at(span);
                }
                let base = self.eval(object)?;
                base.field(field)
                    .ok_or_else(|| RuntimeErrorKind::UnknownField { ty: base.ty(), field: field.clone() })
                    .at(span)
            }
        }
    }

    /// User functions first, then built-ins.
    fn call(&mut self, name: &str, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        let program = self.program;
        if let Some(func) = program.function(name) {
            return self.invoke(func, args, Some(span));
        }
        builtins::call_builtin(name, args, &mut *self.host).at(span)
    }
}
