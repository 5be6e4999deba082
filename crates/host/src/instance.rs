/// Loaded script instances.

use crate::compile::compile;
use crate::config::{HostConfig, ReloadPolicy};
use crate::error::LoadError;
use ferris_checker::CheckedProgram;
use ferris_runtime::{Environment, PropertyError, RuntimeError, ScriptHost, Value};
use parking_lot::Mutex;

/// A checked program together with the state it runs against.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    program: CheckedProgram,
    env: Environment,
}

impl CompiledScript {
    pub fn program(&self) -> &CheckedProgram {
        &self.program
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

struct State {
    script: CompiledScript,
    host: Box<dyn ScriptHost>,
}

/// One script attached to one host object.
///
/// Every operation takes the instance lock, so dispatch, reload and property
/// access never interleave on the same instance.
pub struct ScriptInstance {
    state: Mutex<State>,
    config: HostConfig,
}

impl std::fmt::Debug for ScriptInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptInstance").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ScriptInstance {
    /// Compile `source` and run its script-level initializers against `host`.
    pub fn load(source: &str, host: impl ScriptHost + 'static, config: HostConfig) -> Result<Self, LoadError> {
        let mut host: Box<dyn ScriptHost> = Box::new(host);
        let program = compile(source)?;
        let env = Environment::initialize(&program, host.as_mut(), &config.runtime)?;
        log::info!(
            "loaded script: {} functions, {} globals",
            program.functions().count(),
            program.globals().count()
        );
        Ok(Self {
            state: Mutex::new(State { script: CompiledScript { program, env }, host }),
            config,
        })
    }

    /// Call a script function. A failed call leaves the instance usable.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let mut state = self.state.lock();
        let State { script, host } = &mut *state;
        log::trace!("dispatch `{}` with {} args", name, args.len());
        script.env.call(&script.program, host.as_mut(), name, args)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.state.lock().script.program.function(name).is_some()
    }

    /// Replace the running script.
    ///
    /// The new source is compiled and initialized completely before the swap.
    /// On any failure the previous script keeps running with its state intact.
    pub fn reload(&self, source: &str) -> Result<(), LoadError> {
        let program = compile(source).inspect_err(|err| log::warn!("reload rejected: {}", err))?;

        let mut state = self.state.lock();
        let State { script, host } = &mut *state;
        let env = match self.config.reload_policy {
            ReloadPolicy::Reset => Environment::initialize(&program, host.as_mut(), &self.config.runtime),
            ReloadPolicy::Preserve => {
                Environment::initialize_preserving(&program, host.as_mut(), &self.config.runtime, &script.env)
            }
        }
        .inspect_err(|err| log::warn!("reload initialization failed: {}", err))?;

        *script = CompiledScript { program, env };
        log::info!("reloaded script ({:?} policy)", self.config.reload_policy);
        Ok(())
    }

    pub fn get_property(&self, name: &str) -> Result<Value, PropertyError> {
        self.state.lock().host.get_property(name)
    }

    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<(), PropertyError> {
        self.state.lock().host.set_property(name, value.into())
    }

    /// Current value of a script-level variable.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.state.lock().script.env.global(name).cloned()
    }

    /// Snapshot of every script-level variable, in name order.
    pub fn globals(&self) -> Vec<(String, Value)> {
        let state = self.state.lock();
        state.script.env.globals().map(|(name, binding)| (name.to_string(), binding.value.clone())).collect()
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}
