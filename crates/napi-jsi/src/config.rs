//! Adapter configuration.

use serde::{Deserialize, Serialize};

/// Options of a [`crate::NapiJsiRuntime`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Returned by `Runtime::description`.
    pub description: String,

    /// Returned by `Runtime::is_inspectable`.
    pub inspectable: bool,

    /// Rewrite the engine's `Out of stack space` message to the text other
    /// JSI engines produce.
    pub normalize_stack_overflow: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            description: "NapiJsiRuntime".to_string(),
            inspectable: false,
            normalize_stack_overflow: true,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn inspectable(mut self, inspectable: bool) -> Self {
        self.inspectable = inspectable;
        self
    }

    pub fn normalize_stack_overflow(mut self, normalize: bool) -> Self {
        self.normalize_stack_overflow = normalize;
        self
    }

    /// Load from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.description, "NapiJsiRuntime");
        assert!(!config.inspectable);
        assert!(config.normalize_stack_overflow);
    }

    #[test]
    fn test_json_keeps_defaults() {
        let config = RuntimeConfig::from_json(r#"{"inspectable": true}"#).unwrap();
        assert!(config.inspectable);
        assert_eq!(config.description, "NapiJsiRuntime");

        let config = RuntimeConfig::from_json(r#"{"normalizeStackOverflow": false}"#).unwrap();
        assert!(!config.normalize_stack_overflow);
    }

    #[test]
    fn test_builder() {
        let config = RuntimeConfig::new()
            .description("embedded")
            .inspectable(true)
            .normalize_stack_overflow(false);
        assert_eq!(config.description, "embedded");
        assert!(config.inspectable);
        assert!(!config.normalize_stack_overflow);
    }
}
