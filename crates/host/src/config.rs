/// Per-instance host configuration.

use ferris_runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};

/// What happens to script-level variables when a script is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    /// Run every initializer again.
    #[default]
    Reset,
    /// Keep each variable whose name and type survived the edit.
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub runtime: RuntimeConfig,
    pub reload_policy: ReloadPolicy,
}

impl HostConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let config = HostConfig::from_json(r#"{"reload_policy": "preserve", "runtime": {"max_call_depth": 16}}"#).unwrap();
        assert_eq!(config.reload_policy, ReloadPolicy::Preserve);
        assert_eq!(config.runtime.max_call_depth, 16);
        assert!(config.runtime.rollback_on_error);
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::from_json("{}").unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.reload_policy, ReloadPolicy::Reset);
        assert!(HostConfig::from_json(r#"{"reload_policy": "sometimes"}"#).is_err());
    }
}
