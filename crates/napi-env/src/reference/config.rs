//! Reference engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables of [`super::ReferenceEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvConfig {
    /// Nested script calls allowed before `Out of stack space` is thrown.
    pub max_call_depth: u32,

    /// Allocations between automatic collections when the environment is
    /// idle. `0` disables automatic collection.
    pub gc_threshold: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 48,
            gc_threshold: 10_000,
        }
    }
}

impl EnvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_call_depth(mut self, depth: u32) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold;
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
        let config = EnvConfig::default();
        assert_eq!(config.max_call_depth, 48);
        assert_eq!(config.gc_threshold, 10_000);
    }

    #[test]
    fn test_builder_and_json() {
        let config = EnvConfig::new().max_call_depth(8).gc_threshold(0);
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.gc_threshold, 0);

        let parsed = EnvConfig::from_json(r#"{"maxCallDepth": 12}"#).unwrap();
        assert_eq!(parsed.max_call_depth, 12);
        assert_eq!(parsed.gc_threshold, 10_000);
    }
}
