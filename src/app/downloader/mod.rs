//! Retrying downloads of single resources
//!
//! [`RetryingDownloader`] wraps a [`ByteFetcher`] with a bounded attempt
//! budget and the fixed [`BackoffSchedule`]. Transport failures and
//! non-success statuses take the retry path. A checksum mismatch, when
//! verification is enabled, is returned at once: the same bytes would come
//! back on every attempt.
//!
//! Bytes received by a failed attempt stay counted in the shared progress
//! total, since they were genuinely transferred.

pub mod backoff;
pub mod config;

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::app::client::ByteFetcher;
use crate::app::models::{AssetReference, DownloadOutcome};
use crate::app::progress::ProgressAggregator;
use crate::errors::{DownloadError, DownloadResult};

pub use backoff::BackoffSchedule;
pub use config::DownloaderConfig;

/// Downloader that retries one URL until success or exhaustion
#[derive(Clone)]
pub struct RetryingDownloader {
    fetcher: Arc<dyn ByteFetcher>,
    config: DownloaderConfig,
    schedule: BackoffSchedule,
}

impl RetryingDownloader {
    /// Create a downloader with the default backoff schedule
    pub fn new(fetcher: Arc<dyn ByteFetcher>, config: DownloaderConfig) -> Self {
        Self {
            fetcher,
            config,
            schedule: BackoffSchedule::default(),
        }
    }

    /// Replace the backoff schedule
    pub fn with_schedule(mut self, schedule: BackoffSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    /// Download `url` with retries
    pub async fn download(
        &self,
        url: &str,
        progress: &ProgressAggregator,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        self.run(url, None, progress, cancel).await
    }

    /// Download one asset from `asset_base`, verifying MD5-named content when enabled
    pub async fn download_asset(
        &self,
        reference: &AssetReference,
        asset_base: &str,
        progress: &ProgressAggregator,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        let url = reference.download_url(asset_base);
        let expected = (self.config.verify_checksums && reference.is_md5_id())
            .then_some(reference);
        self.run(&url, expected, progress, cancel).await
    }

    async fn run(
        &self,
        url: &str,
        expected: Option<&AssetReference>,
        progress: &ProgressAggregator,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return cancelled(url, attempts);
            }
            attempts += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(url, attempts),
                result = self.attempt(url, expected, progress) => result,
            };

            let failure = match result {
                Ok(bytes) => {
                    debug!("Downloaded {} ({} bytes, attempt {})", url, bytes.len(), attempts);
                    return DownloadOutcome::success(bytes, attempts);
                }
                Err(e) => e,
            };

            if matches!(failure, DownloadError::ChecksumMismatch { .. }) {
                error!("Rejecting {}: {}", url, failure);
                return DownloadOutcome::Failure {
                    cause: failure,
                    attempts,
                };
            }

            if attempts >= max_attempts {
                error!("Giving up on {} after {} attempts: {}", url, attempts, failure);
                return DownloadOutcome::Failure {
                    cause: DownloadError::ExhaustedRetries {
                        url: url.to_string(),
                        attempts,
                    },
                    attempts,
                };
            }

            let delay = self.schedule.delay_for(attempts);
            warn!(
                "Download failed (attempt {}/{}): {}. Retrying in {}ms",
                attempts,
                max_attempts,
                failure,
                delay.as_millis()
            );

            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return cancelled(url, attempts),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    /// One request, judged by status and optional checksum
    async fn attempt(
        &self,
        url: &str,
        expected: Option<&AssetReference>,
        progress: &ProgressAggregator,
    ) -> DownloadResult<Bytes> {
        let request = progress.request();
        let on_progress = |received: u64, _total: Option<u64>| {
            request.observe(received);
        };
        let body = self.fetcher.fetch(url, &on_progress).await?;
        // Count bodies whose length was never reported through progress events
        request.observe(body.bytes.len() as u64);
        let bytes = body.into_success(url)?;

        if let Some(reference) = expected {
            verify_md5(reference, &bytes)?;
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for RetryingDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingDownloader")
            .field("config", &self.config)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

fn cancelled(url: &str, attempts: u32) -> DownloadOutcome {
    debug!("Download of {} cancelled after {} attempts", url, attempts);
    DownloadOutcome::Failure {
        cause: DownloadError::Cancelled {
            url: url.to_string(),
        },
        attempts,
    }
}

/// Check that `bytes` hash to the reference's MD5 id
pub fn verify_md5(reference: &AssetReference, bytes: &[u8]) -> DownloadResult<()> {
    let actual = format!("{:x}", md5::compute(bytes));
    if actual.eq_ignore_ascii_case(&reference.id) {
        Ok(())
    } else {
        Err(DownloadError::ChecksumMismatch {
            asset: reference.to_string(),
            expected: reference.id.clone(),
            actual,
        })
    }
}
