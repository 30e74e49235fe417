//! Prelude module for SB3 Fetcher Library
//!
//! Re-exports the items most integrations need, so a single
//! `use sb3_fetcher::prelude::*;` covers typical usage.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sb3_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let downloader = ProjectDownloader::from_config(&config, ProgressCallbacks::default())?;
//!     let project = downloader.download("10128407", None).await?;
//!     println!("{} ({} bytes)", project.filename, project.archive.size());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Pipeline components
pub use crate::app::{
    ArchiveBuilder, AssetReference, BackoffSchedule, BuiltArchive, ByteFetcher, ClientConfig,
    CoordinatorConfig, DownloadStats, DownloadedProject, DownloaderConfig, EndpointConfig,
    ProgressAggregator, ProgressCallbacks, ProjectDescriptor, ProjectDownloader,
    extract_project_id,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_MAX_ATTEMPTS, DESCRIPTOR_ENTRY, ENV_PROJECT_TOKEN, USER_AGENT};

pub use std::sync::Arc;

pub use tokio;
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _client_config = ClientConfig::default();
        let _coordinator_config = CoordinatorConfig::default();
        let _downloader_config = DownloaderConfig::default();
        let _app_config = AppConfig::default();

        assert_eq!(DEFAULT_MAX_ATTEMPTS, 20);
        assert!(USER_AGENT.contains("SB3-Fetcher"));
    }

    #[test]
    fn test_prelude_integration_pattern() {
        let fetcher: Arc<dyn ByteFetcher> = Arc::new(crate::app::ScriptedFetcher::new());
        let downloader = ProjectDownloader::with_fetcher(
            fetcher,
            &AppConfig::default(),
            ProgressCallbacks::default(),
        );
        let _ = format!("{:?}", downloader);
        assert_eq!(extract_project_id("projects/42/").as_deref(), Some("42"));
    }
}
