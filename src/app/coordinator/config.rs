//! Configuration for the asset download coordinator
//!
//! Controls how many asset downloads may be in flight at once.

use serde::{Deserialize, Serialize};

use crate::constants::coordinator;
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the download coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Maximum concurrent asset downloads; 0 starts every download at once
    pub max_concurrency: usize,
    /// Emit a status line for every completed asset
    pub report_items: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: coordinator::DEFAULT_MAX_CONCURRENCY,
            report_items: true,
        }
    }
}

impl CoordinatorConfig {
    /// Bound the number of concurrent downloads (0 for unbounded)
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Enable or disable per-asset status lines
    pub fn with_item_reports(mut self, enabled: bool) -> Self {
        self.report_items = enabled;
        self
    }

    /// Whether downloads are limited by a permit pool
    pub fn is_bounded(&self) -> bool {
        self.max_concurrency > 0
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrency > coordinator::MAX_CONCURRENCY_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "coordinator.max_concurrency".to_string(),
                value: self.max_concurrency.to_string(),
                reason: format!(
                    "Concurrency cannot exceed {}",
                    coordinator::MAX_CONCURRENCY_LIMIT
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Default configuration starts every download immediately
    #[test]
    fn test_default_config_is_unbounded() {
        let config = CoordinatorConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_bounded());
        assert!(config.report_items);
    }

    #[test]
    fn test_config_builder_methods() {
        let config = CoordinatorConfig::default()
            .with_max_concurrency(8)
            .with_item_reports(false);

        assert_eq!(config.max_concurrency, 8);
        assert!(config.is_bounded());
        assert!(!config.report_items);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = CoordinatorConfig::default()
            .with_max_concurrency(coordinator::MAX_CONCURRENCY_LIMIT + 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
