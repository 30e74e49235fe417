//! Configuration for the retrying downloader

use serde::{Deserialize, Serialize};

use crate::constants::retry;
use crate::errors::{ConfigError, ConfigResult};

/// Retry policy settings for one asset download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Requests issued per asset before giving up
    pub max_attempts: u32,
    /// Reject MD5-named assets whose content digest differs (off by default)
    pub verify_checksums: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            verify_checksums: false,
        }
    }
}

impl DownloaderConfig {
    /// Set the attempt budget
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Enable or disable checksum verification
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "downloader.max_attempts".to_string(),
                value: "0".to_string(),
                reason: "At least one attempt is required".to_string(),
            });
        }
        Ok(())
    }
}
