/// The capability boundary between a script and the node it drives.

use crate::value::{NodeRef, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("no getter registered for property `{0}`")]
    NoGetter(String),
    #[error("no setter registered for property `{0}`")]
    NoSetter(String),
    #[error("property `{name}` rejected the value: {reason}")]
    Rejected { name: String, reason: String },
}

/// What a script may ask of its host.
///
/// `self.field` reads call `get_property`, writes call `set_property`. Each
/// script instance owns its host exclusively.
pub trait ScriptHost: Send {
    fn get_property(&self, name: &str) -> Result<Value, PropertyError>;

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError>;

    /// Handle for bare `self`.
    fn node(&self) -> NodeRef {
        NodeRef::default()
    }

    /// Output of the `print` built-in.
    fn print(&mut self, line: &str) {
        println!("{}", line);
    }
}
