//! Core application logic for SB3 Fetcher
//!
//! This module contains the download pipeline: byte fetching, retrying
//! downloads, descriptor loading and asset resolution, concurrent asset
//! orchestration, progress aggregation and archive assembly.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sb3_fetcher::app::{ProjectDownloader, ProgressCallbacks};
//! use sb3_fetcher::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let downloader = ProjectDownloader::from_config(&config, ProgressCallbacks::default())?;
//!
//! let project = downloader.download("10128407", None).await?;
//! std::fs::write(&project.filename, &project.archive.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod client;
pub mod coordinator;
pub mod descriptor;
pub mod downloader;
pub mod models;
pub mod progress;
pub mod session;

// Re-export main public API
pub use archive::{ArchiveBuilder, BuiltArchive, CompressionProgress};
pub use client::{ByteFetcher, ClientConfig, EndpointConfig, HttpFetcher, ScriptedFetcher, ScriptedResponse};
pub use coordinator::{Coordinator, CoordinatorConfig, DownloadStats};
pub use descriptor::{DescriptorLoader, LoadedDescriptor, ProjectDescriptor, TokenResolver};
pub use downloader::{BackoffSchedule, DownloaderConfig, RetryingDownloader};
pub use models::{ArchiveEntry, AssetReference, DownloadOutcome, ProjectMetadata};
pub use progress::{ItemProgress, ProgressAggregator, ProgressCallbacks};
pub use session::{extract_project_id, DownloadedProject, ProjectDownloader};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Ensure public API is accessible
        let config = ClientConfig::default();
        assert!(config.tcp_nodelay);
        assert_eq!(DownloaderConfig::default().max_attempts, 20);
        assert!(!CoordinatorConfig::default().is_bounded());
    }
}
