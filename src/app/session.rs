//! End-to-end project download
//!
//! [`ProjectDownloader`] ties the pipeline together: descriptor loading,
//! asset resolution, concurrent asset downloads and archive finalization.
//! Either a complete archive comes back or an error does; nothing partial
//! is ever returned.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::archive::{ArchiveBuilder, BuiltArchive, CompressionReporter};
use crate::app::client::{ByteFetcher, EndpointConfig, HttpFetcher};
use crate::app::coordinator::{Coordinator, CoordinatorConfig, DownloadStats};
use crate::app::descriptor::DescriptorLoader;
use crate::app::downloader::{DownloaderConfig, RetryingDownloader};
use crate::app::progress::{ProgressAggregator, ProgressCallbacks};
use crate::config::AppConfig;
use crate::constants::archive::ARCHIVE_EXTENSION;
use crate::errors::{AppError, Result};

static PROJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Failed to compile project id regex"));

/// Characters replaced when turning a title into a file name
const RESERVED_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// First run of digits in `input`, as typed into a URL box or pasted from a share link
pub fn extract_project_id(input: &str) -> Option<String> {
    PROJECT_ID.find(input).map(|m| m.as_str().to_string())
}

/// Make `title` usable as a file name, or `None` if nothing usable remains
pub fn sanitize_title(title: &str) -> Option<String> {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.').trim_end();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// `{title}.sb3`, or `project_{id}.sb3` when no usable title is known
pub fn output_filename(title: Option<&str>, project_id: &str) -> String {
    match title.and_then(sanitize_title) {
        Some(title) => format!("{}.{}", title, ARCHIVE_EXTENSION),
        None => format!("project_{}.{}", project_id, ARCHIVE_EXTENSION),
    }
}

/// Final status line of a download
pub fn completion_message(filename: &str, formatted_size: &str) -> String {
    format!(
        "Download completed: {}\nFile size: {}",
        filename, formatted_size
    )
}

/// A finished project archive
#[derive(Debug, Clone)]
pub struct DownloadedProject {
    pub project_id: String,
    pub filename: String,
    pub title: Option<String>,
    pub archive: BuiltArchive,
    pub stats: DownloadStats,
    /// Bytes received over the network, failed attempts included
    pub bytes_received: u64,
}

/// Downloads whole projects into `.sb3` archives
#[derive(Debug, Clone)]
pub struct ProjectDownloader {
    loader: DescriptorLoader,
    coordinator: Coordinator,
    callbacks: ProgressCallbacks,
}

impl ProjectDownloader {
    /// Assemble a downloader from its parts
    pub fn new(
        fetcher: Arc<dyn ByteFetcher>,
        endpoints: EndpointConfig,
        downloader_config: DownloaderConfig,
        coordinator_config: CoordinatorConfig,
        callbacks: ProgressCallbacks,
    ) -> Self {
        let asset_base = endpoints.asset_base.clone();
        Self {
            loader: DescriptorLoader::new(fetcher.clone(), endpoints),
            coordinator: Coordinator::new(
                coordinator_config,
                RetryingDownloader::new(fetcher, downloader_config),
                asset_base,
            ),
            callbacks,
        }
    }

    /// Build a downloader over HTTP from application configuration
    pub fn from_config(config: &AppConfig, callbacks: ProgressCallbacks) -> Result<Self> {
        config.validate()?;
        let client = config.client.build_http_client()?;
        Ok(Self::with_fetcher(
            Arc::new(HttpFetcher::new(client)),
            config,
            callbacks,
        ))
    }

    /// Build a downloader over `fetcher` from application configuration
    pub fn with_fetcher(
        fetcher: Arc<dyn ByteFetcher>,
        config: &AppConfig,
        callbacks: ProgressCallbacks,
    ) -> Self {
        Self::new(
            fetcher,
            config.endpoints.clone(),
            config.downloader.clone(),
            config.coordinator.clone(),
            callbacks,
        )
    }

    /// Download `project_id`, resolving a token first when none is given
    pub async fn download(&self, project_id: &str, token: Option<&str>) -> Result<DownloadedProject> {
        self.download_with_cancel(project_id, token, &CancellationToken::new())
            .await
    }

    /// Download `project_id`, stopping early once `cancel` fires
    pub async fn download_with_cancel(
        &self,
        project_id: &str,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<DownloadedProject> {
        let progress = Arc::new(ProgressAggregator::new(self.callbacks.clone()));

        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(AppError::generic("Download cancelled before the descriptor arrived"));
            }
            loaded = self.loader.load(project_id, token, &progress) => loaded?,
        };

        let assets = loaded.descriptor.asset_references();
        info!("Project {} references {} unique assets", project_id, assets.len());

        let mut archive = ArchiveBuilder::new(&assets);
        archive.add(loaded.descriptor.archive_entry())?;

        self.callbacks.log("Starting asset downloads...");
        let stats = self
            .coordinator
            .run_downloads(&assets, &mut archive, progress.clone(), cancel)
            .await?;

        self.callbacks.log("Compressing zip...");
        let callbacks = self.callbacks.clone();
        let built = tokio::task::spawn_blocking(move || {
            let mut reporter = CompressionReporter::new(|line: &str| callbacks.log(line));
            archive.finalize(|event| {
                reporter.report(event);
            })
        })
        .await
        .map_err(|e| AppError::generic(format!("Archive task failed: {}", e)))??;

        let filename = output_filename(loaded.title.as_deref(), project_id);
        self.callbacks.log(&completion_message(
            &filename,
            &self.callbacks.format_size(built.size()),
        ));

        Ok(DownloadedProject {
            project_id: project_id.to_string(),
            filename,
            title: loaded.title,
            archive: built,
            stats,
            bytes_received: progress.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_project_id() {
        assert_eq!(extract_project_id("10128407").as_deref(), Some("10128407"));
        assert_eq!(
            extract_project_id("https://scratch.mit.edu/projects/10128407/editor").as_deref(),
            Some("10128407")
        );
        assert_eq!(extract_project_id("  #42 and 7").as_deref(), Some("42"));
        assert_eq!(extract_project_id("no digits here"), None);
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("My Game").as_deref(), Some("My Game"));
        assert_eq!(sanitize_title("a/b:c?").as_deref(), Some("a_b_c_"));
        assert_eq!(sanitize_title("  spaced out.  ").as_deref(), Some("spaced out"));
        assert_eq!(sanitize_title("line\nbreak").as_deref(), Some("line_break"));
        assert_eq!(sanitize_title("   "), None);
        assert_eq!(sanitize_title("///"), None);
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename(Some("Pong"), "7"), "Pong.sb3");
        assert_eq!(output_filename(Some(""), "7"), "project_7.sb3");
        assert_eq!(output_filename(None, "7"), "project_7.sb3");
    }

    #[test]
    fn test_completion_message() {
        assert_eq!(
            completion_message("Pong.sb3", "1.50 KB"),
            "Download completed: Pong.sb3\nFile size: 1.50 KB"
        );
    }
}
