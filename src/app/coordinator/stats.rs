//! Download statistics for one coordinator run

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Aggregated asset download statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadStats {
    /// Unique assets the run had to fetch
    pub total_assets: usize,
    /// Assets downloaded successfully
    pub assets_completed: usize,
    /// Requests issued across every asset, retries included
    pub total_attempts: u64,
    /// Bytes of asset content kept in the archive
    pub asset_bytes: u64,
    /// Wall time spent downloading assets
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl DownloadStats {
    /// Create statistics expecting `total_assets` downloads
    pub fn new_with_expected_assets(total_assets: usize) -> Self {
        Self {
            total_assets,
            ..Default::default()
        }
    }

    /// Record one successful asset
    pub fn record_success(&mut self, size: u64, attempts: u32) {
        self.assets_completed += 1;
        self.asset_bytes += size;
        self.total_attempts += u64::from(attempts);
    }

    /// Requests beyond the first per completed asset
    pub fn retries(&self) -> u64 {
        self.total_attempts.saturating_sub(self.assets_completed as u64)
    }

    /// Calculate completion percentage
    pub fn completion_percentage(&self) -> f64 {
        if self.total_assets == 0 {
            return 100.0;
        }
        (self.assets_completed as f64 / self.total_assets as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut stats = DownloadStats::new_with_expected_assets(4);
        assert_eq!(stats.completion_percentage(), 0.0);

        stats.record_success(100, 1);
        stats.record_success(50, 3);

        assert_eq!(stats.assets_completed, 2);
        assert_eq!(stats.asset_bytes, 150);
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.retries(), 2);
        assert_eq!(stats.completion_percentage(), 50.0);
    }

    #[test]
    fn test_empty_run_is_complete() {
        let stats = DownloadStats::new_with_expected_assets(0);
        assert_eq!(stats.completion_percentage(), 100.0);
        assert_eq!(stats.retries(), 0);
    }
}
