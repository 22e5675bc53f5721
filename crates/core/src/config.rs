//! Engine configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings that shape how a stream tree is built for one query.
///
/// ```toml
/// shard_uid_threshold = 5000
/// ancestor_dedup = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Leaf shards holding more uids than this are marked infinite instead of
    /// being enumerated. `None` enumerates everything.
    pub shard_uid_threshold: Option<usize>,
    /// Wrap the root stream in the ancestor-dedup decorator.
    pub ancestor_dedup: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shard_uid_threshold: None,
            ancestor_dedup: false,
        }
    }
}

impl EngineConfig {
    /// Settings for hierarchical (parent/child record) datasets.
    pub fn hierarchical() -> Self {
        Self {
            ancestor_dedup: true,
            ..Self::default()
        }
    }

    /// Sets the per-shard uid threshold.
    pub fn with_shard_uid_threshold(mut self, threshold: usize) -> Self {
        self.shard_uid_threshold = Some(threshold);
        self
    }

    /// Enables or disables ancestor deduplication.
    pub fn with_ancestor_dedup(mut self, enabled: bool) -> Self {
        self.ancestor_dedup = enabled;
        self
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(source).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.shard_uid_threshold == Some(0) {
            return Err(Error::config("shard_uid_threshold must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.shard_uid_threshold, None);
        assert!(!config.ancestor_dedup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            shard_uid_threshold = 250
            ancestor_dedup = true
            "#,
        )
        .unwrap();

        assert_eq!(config, EngineConfig::hierarchical().with_shard_uid_threshold(250));
    }

    #[test]
    fn test_from_toml_partial_uses_defaults() {
        let config = EngineConfig::from_toml_str("ancestor_dedup = true").unwrap();
        assert_eq!(config.shard_uid_threshold, None);
        assert!(config.ancestor_dedup);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let err = EngineConfig::from_toml_str("shard_uid_threshold = 0").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = EngineConfig::from_toml_str("ancestor_dedup = 'maybe'").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
