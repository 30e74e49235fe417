//! Asset download orchestration
//!
//! The coordinator starts one retrying download per unique asset reference,
//! collects completions into the archive builder as they settle, and fails
//! fast on the first permanent error. The collecting loop is the only place
//! that touches the archive builder and the completed-item counter, so those
//! need no further synchronization.
//!
//! # Architecture
//!
//! - [`config`] - Concurrency settings and validation
//! - [`stats`] - Per-run download statistics
//! - [`signals`] - Termination signals mapped onto cancellation
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sb3_fetcher::app::archive::ArchiveBuilder;
//! use sb3_fetcher::app::client::{ClientConfig, EndpointConfig, HttpFetcher};
//! use sb3_fetcher::app::coordinator::{Coordinator, CoordinatorConfig};
//! use sb3_fetcher::app::downloader::{DownloaderConfig, RetryingDownloader};
//! use sb3_fetcher::app::models::AssetReference;
//! use sb3_fetcher::app::progress::{ProgressAggregator, ProgressCallbacks};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpFetcher::new(ClientConfig::default().build_http_client()?));
//! let downloader = RetryingDownloader::new(fetcher, DownloaderConfig::default());
//! let coordinator = Coordinator::new(
//!     CoordinatorConfig::default().with_max_concurrency(8),
//!     downloader,
//!     EndpointConfig::default().asset_base,
//! );
//!
//! let assets = vec![AssetReference::new("83a9787d4cb6f3b7632b4ddfebf74367", "wav")];
//! let mut archive = ArchiveBuilder::new(&assets);
//! let progress = Arc::new(ProgressAggregator::new(ProgressCallbacks::default()));
//!
//! let stats = coordinator
//!     .run_downloads(&assets, &mut archive, progress, &CancellationToken::new())
//!     .await?;
//! println!("Downloaded {} assets", stats.assets_completed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod signals;
pub mod stats;

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::app::archive::ArchiveBuilder;
use crate::app::downloader::RetryingDownloader;
use crate::app::models::AssetReference;
use crate::app::progress::{ItemProgress, ProgressAggregator};
use crate::errors::{DownloadError, DownloadResult, Result};

pub use config::CoordinatorConfig;
pub use signals::spawn_signal_listener;
pub use stats::DownloadStats;

/// A finished asset download waiting to be archived
#[derive(Debug)]
struct CompletedAsset {
    reference: AssetReference,
    bytes: Bytes,
    attempts: u32,
}

/// Fans asset downloads out and gathers them into an archive
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: CoordinatorConfig,
    downloader: Arc<RetryingDownloader>,
    asset_base: String,
}

impl Coordinator {
    /// Create a coordinator fetching assets from `asset_base`
    pub fn new(
        config: CoordinatorConfig,
        downloader: RetryingDownloader,
        asset_base: impl Into<String>,
    ) -> Self {
        Self {
            config,
            downloader: Arc::new(downloader),
            asset_base: asset_base.into(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Download every asset into `archive`
    ///
    /// Returns once every task has settled, or with the first permanent
    /// failure. On failure the remaining tasks are cancelled and aborted
    /// before returning; `cancel` itself is only observed, never triggered.
    pub async fn run_downloads(
        &self,
        assets: &[AssetReference],
        archive: &mut ArchiveBuilder,
        progress: Arc<ProgressAggregator>,
        cancel: &CancellationToken,
    ) -> Result<DownloadStats> {
        let started = Instant::now();
        let mut stats = DownloadStats::new_with_expected_assets(assets.len());

        if assets.is_empty() {
            info!("No assets to download");
            return Ok(stats);
        }

        let run_token = cancel.child_token();
        let semaphore = self
            .config
            .is_bounded()
            .then(|| Arc::new(Semaphore::new(self.config.max_concurrency)));

        info!(
            "Downloading {} assets ({})",
            assets.len(),
            match &semaphore {
                Some(_) => format!("at most {} at once", self.config.max_concurrency),
                None => "all at once".to_string(),
            }
        );

        let mut tasks = JoinSet::new();
        for reference in assets.iter().cloned() {
            tasks.spawn(Self::download_task(
                self.downloader.clone(),
                self.asset_base.clone(),
                reference,
                progress.clone(),
                run_token.clone(),
                semaphore.clone(),
            ));
        }

        let mut items = ItemProgress::new(assets.len());
        let collected = self
            .collect(&mut tasks, archive, &progress, &mut items, &mut stats)
            .await;

        if let Err(e) = &collected {
            error!(
                "Asset download failed, cancelling {} outstanding downloads: {}",
                tasks.len(),
                e
            );
            run_token.cancel();
            tasks.abort_all();
        }
        collected?;

        stats.elapsed = started.elapsed();
        info!(
            "Downloaded {} assets ({} retries) in {:.2?}",
            stats.assets_completed,
            stats.retries(),
            stats.elapsed
        );
        Ok(stats)
    }

    async fn download_task(
        downloader: Arc<RetryingDownloader>,
        asset_base: String,
        reference: AssetReference,
        progress: Arc<ProgressAggregator>,
        cancel: CancellationToken,
        semaphore: Option<Arc<Semaphore>>,
    ) -> DownloadResult<CompletedAsset> {
        let _permit = match semaphore {
            Some(semaphore) => Some(tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(DownloadError::Cancelled {
                        url: reference.download_url(&asset_base),
                    });
                }
                permit = semaphore.acquire_owned() => permit.map_err(|e| DownloadError::TaskFailed {
                    reason: e.to_string(),
                })?,
            }),
            None => None,
        };

        let outcome = downloader
            .download_asset(&reference, &asset_base, &progress, &cancel)
            .await;
        let attempts = outcome.attempts();
        let bytes = outcome.into_result()?;
        debug!("Asset {} settled after {} attempts", reference, attempts);

        Ok(CompletedAsset {
            reference,
            bytes,
            attempts,
        })
    }

    /// Drain settled tasks into the archive until all are done or one fails
    async fn collect(
        &self,
        tasks: &mut JoinSet<DownloadResult<CompletedAsset>>,
        archive: &mut ArchiveBuilder,
        progress: &ProgressAggregator,
        items: &mut ItemProgress,
        stats: &mut DownloadStats,
    ) -> Result<()> {
        while let Some(joined) = tasks.join_next().await {
            let completed = match joined {
                Ok(result) => result?,
                Err(e) => {
                    return Err(DownloadError::TaskFailed {
                        reason: e.to_string(),
                    }
                    .into())
                }
            };

            let size = completed.bytes.len() as u64;
            archive.add_asset(&completed.reference, completed.bytes)?;
            items.record_completion();
            stats.record_success(size, completed.attempts);

            if self.config.report_items {
                progress
                    .callbacks()
                    .log(&items.asset_message(&completed.reference.entry_name()));
            }
        }
        Ok(())
    }
}
