/// Built-in function implementations.
///
/// Signatures live in `ferris_checker::builtins`; the checker has already
/// validated arity and argument types by the time these run, but arguments
/// are re-validated so a host-typed value can never cause a panic.

use crate::error::RuntimeErrorKind;
use crate::host::ScriptHost;
use crate::value::{Value, ValueError, Vector2};
use ferris_checker::builtins::{self as signatures, Params};
use ferris_language::Type;

pub fn call_builtin(name: &str, args: Vec<Value>, host: &mut dyn ScriptHost) -> Result<Value, RuntimeErrorKind> {
    let signature = signatures::lookup(name).ok_or_else(|| RuntimeErrorKind::UndefinedFunction(name.to_string()))?;
    if let Params::Fixed(params) = signature.params {
        if params.len() != args.len() {
            return Err(RuntimeErrorKind::ArgumentCount {
                name: name.to_string(),
                expected: params.len(),
                found: args.len(),
            });
        }
    }

    match name {
        "print" => {
            let text: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            host.print(&text.join(" "));
            Ok(Value::Void)
        }
        "abs" => Ok(Value::Float(float(&args[0])?.abs())),
        "sqrt" => Ok(Value::Float(float(&args[0])?.sqrt())),
        "min" => Ok(Value::Float(float(&args[0])?.min(float(&args[1])?))),
        "max" => Ok(Value::Float(float(&args[0])?.max(float(&args[1])?))),
        "clamp" => {
            let (v, lo, hi) = (float(&args[0])?, float(&args[1])?, float(&args[2])?);
            // f32::clamp panics when lo > hi; scripts get the upper bound instead.
            Ok(Value::Float(v.max(lo).min(hi)))
        }
        "vec2" => Ok(Value::Vector2(Vector2::new(float(&args[0])?, float(&args[1])?))),
        "len" => match &args[0] {
            Value::String(s) => {
                let n = i32::try_from(s.chars().count())
                    .map_err(|_| RuntimeErrorKind::IntegerOverflow("len".to_string()))?;
                Ok(Value::Int(n))
            }
            other => Err(ValueError { expected: Type::String, found: other.ty() }.into()),
        },
        _ => Err(RuntimeErrorKind::UndefinedFunction(name.to_string())),
    }
}

fn float(value: &Value) -> Result<f32, RuntimeErrorKind> {
    value.as_float().ok_or_else(|| ValueError { expected: Type::Float, found: value.ty() }.into())
}
