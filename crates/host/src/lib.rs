/// Host binding layer: how an engine loads, drives and hot-reloads scripts.
///
/// A `ScriptInstance` owns one compiled script, its persistent state and the
/// host that backs `self`. Calls into one instance are serialized by a lock;
/// separate instances share nothing.

pub mod compile;
pub mod config;
pub mod error;
pub mod hosts;
pub mod instance;
pub mod marshal;

pub use compile::compile;
pub use config::{HostConfig, ReloadPolicy};
pub use error::{CompileError, LoadError};
pub use hosts::{FieldStore, PropertyMap};
pub use instance::{CompiledScript, ScriptInstance};

pub use ferris_language::{Diagnostic, Stage};
pub use ferris_runtime::{NodeRef, PropertyError, RuntimeConfig, RuntimeError, ScriptHost, Value, Vector2};
