//! Configuration management for SB3 Fetcher
//!
//! Settings come from one TOML file found by [`AppConfig::load`]: an explicit
//! `--config` path, else `./sb3-fetcher.toml`, else the user config directory.
//! Every section is optional; missing values fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::client::{ClientConfig, EndpointConfig};
use crate::app::coordinator::CoordinatorConfig;
use crate::app::downloader::DownloaderConfig;
use crate::constants::files;
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote service base URLs
    pub endpoints: EndpointConfig,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Per-asset retry settings
    pub downloader: DownloaderConfig,
    /// Concurrency settings
    pub coordinator: CoordinatorConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when neither flags nor `RUST_LOG` choose one
    pub level: String,
    /// Use ANSI colors in log output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            colored_output: true,
        }
    }
}

impl AppConfig {
    /// Load configuration, falling back to defaults when no file exists
    ///
    /// An explicitly requested file must exist.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.client.validate()?;
        self.downloader.validate()?;
        self.coordinator.validate()?;

        for (field, value) in [
            ("endpoints.descriptor_base", &self.endpoints.descriptor_base),
            ("endpoints.meta_base", &self.endpoints.meta_base),
            ("endpoints.asset_base", &self.endpoints.asset_base),
        ] {
            if let Err(e) = url::Url::parse(value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Path of the per-user configuration file
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Write a commented default configuration to `path`
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> ConfigResult<()> {
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: path.display().to_string(),
                reason: "File already exists (use --force to overwrite)".to_string(),
            });
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, Self::generate_default_config_content()?)
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    fn find_config_file() -> Option<PathBuf> {
        let search_paths = [
            Some(PathBuf::from(files::LOCAL_CONFIG_FILE)),
            Self::default_config_path(),
        ];

        search_paths.into_iter().flatten().find(|path| {
            let found = path.exists();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }

    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn generate_default_config_content() -> ConfigResult<String> {
        let body = toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            value: "default".to_string(),
            reason: e.to_string(),
        })?;

        Ok(format!(
            "# SB3 Fetcher configuration\n\
             # coordinator.max_concurrency = 0 starts every asset download at once.\n\
             # Durations accept humantime strings such as \"30s\" or \"1m 30s\".\n\n{}",
            body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(config.downloader.max_attempts, 20);
        assert_eq!(config.coordinator.max_concurrency, 0);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.endpoints, EndpointConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content().unwrap();

        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.downloader, DownloaderConfig::default());
        assert_eq!(parsed.client.request_timeout, ClientConfig::default().request_timeout);
        assert!(content.starts_with("# SB3 Fetcher configuration"));
        assert!(content.contains("[endpoints]"));
        assert!(content.contains("[coordinator]"));
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sb3.toml");

        let test_config = r#"
[downloader]
max_attempts = 5

[coordinator]
max_concurrency = 16

[client]
request_timeout = "2m"

[logging]
level = "debug"
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();

        assert_eq!(config.downloader.max_attempts, 5);
        assert!(!config.downloader.verify_checksums);
        assert_eq!(config.coordinator.max_concurrency, 16);
        assert_eq!(config.client.request_timeout, Duration::from_secs(120));
        assert_eq!(config.client.connect_timeout, ClientConfig::default().connect_timeout);
        assert_eq!(config.logging.level, "debug");
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "[downloader]\nmax_attempts = 0\n")
            .await
            .unwrap();

        assert!(matches!(
            AppConfig::load(Some(config_path)).await,
            Err(ConfigError::InvalidValue { .. })
        ));

        let config = AppConfig {
            endpoints: EndpointConfig {
                asset_base: "not a url".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_write_default_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        AppConfig::write_default(&path, false).await.unwrap();
        assert!(AppConfig::load(Some(path.clone())).await.is_ok());

        assert!(AppConfig::write_default(&path, false).await.is_err());
        assert!(AppConfig::write_default(&path, true).await.is_ok());
    }
}
