//! Fixed backoff schedule for asset retries
//!
//! The delay before the next attempt is looked up by the number of the
//! attempt that just failed. Bands are inclusive upper bounds.

use std::time::Duration;

use crate::constants::retry::BACKOFF_SCHEDULE;

/// Table mapping failed-attempt number to the wait before the next attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    bands: Vec<(u32, Duration)>,
}

impl BackoffSchedule {
    /// Build a schedule from `(last attempt in band, delay)` pairs
    ///
    /// Bands are sorted by their upper bound. An empty schedule never waits.
    pub fn new(mut bands: Vec<(u32, Duration)>) -> Self {
        bands.sort_by_key(|(upper, _)| *upper);
        Self { bands }
    }

    /// Schedule that retries immediately every time
    pub fn immediate() -> Self {
        Self { bands: Vec::new() }
    }

    /// Delay to wait after attempt number `attempt` (1-based) failed
    ///
    /// Attempts past the last band reuse the last band's delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.bands
            .iter()
            .find(|(upper, _)| attempt <= *upper)
            .or_else(|| self.bands.last())
            .map_or(Duration::ZERO, |(_, delay)| *delay)
    }

    /// Sum of delays waited before attempt `attempts_until_success` succeeds
    pub fn total_delay_before(&self, attempts_until_success: u32) -> Duration {
        (1..attempts_until_success).map(|attempt| self.delay_for(attempt)).sum()
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::new(BACKOFF_SCHEDULE.to_vec())
    }
}
