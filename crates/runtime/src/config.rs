/// Runtime limits and call semantics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Deepest chain of nested script calls before the call fails.
    pub max_call_depth: usize,
    /// Restore script-level variables when a call fails partway through.
    pub rollback_on_error: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { max_call_depth: 64, rollback_on_error: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RuntimeConfig = serde_json::from_str(r#"{"max_call_depth": 8}"#).unwrap();
        assert_eq!(config.max_call_depth, 8);
        assert!(config.rollback_on_error);
    }
}
