//! Byte-level and item-level progress aggregation
//!
//! A single [`ProgressAggregator`] is shared by every request of a project
//! download. Each request observes its own cumulative byte count through a
//! [`RequestProgress`] tracker, which forwards only the delta since its
//! previous event. Updates and reports are serialized by one lock, so the
//! reported total never decreases regardless of how concurrent requests
//! interleave.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::constants::progress::BAR_WIDTH;

/// Receives human-readable status strings
pub type StatusLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Formats a byte count for display
pub type SizeFormatter = Arc<dyn Fn(u64) -> String + Send + Sync>;

/// Receives the formatted running total of bytes received
pub type TotalReporter = Arc<dyn Fn(&str) + Send + Sync>;

/// Caller-supplied presentation collaborators
///
/// The total reporter and size formatter run while the aggregator's lock is
/// held. They must not call back into the [`ProgressAggregator`] (for example
/// [`ProgressAggregator::total`]); the reported total arrives as the argument.
#[derive(Clone)]
pub struct ProgressCallbacks {
    pub logger: StatusLogger,
    pub size_formatter: SizeFormatter,
    pub total_reporter: TotalReporter,
}

impl ProgressCallbacks {
    pub fn new(logger: StatusLogger, size_formatter: SizeFormatter, total_reporter: TotalReporter) -> Self {
        Self {
            logger,
            size_formatter,
            total_reporter,
        }
    }

    /// Emit a status line through the logger
    pub fn log(&self, message: &str) {
        (self.logger)(message);
    }

    /// Format a byte count through the size formatter
    pub fn format_size(&self, bytes: u64) -> String {
        (self.size_formatter)(bytes)
    }
}

impl Default for ProgressCallbacks {
    /// Status lines go to tracing, sizes print as raw byte counts, totals are dropped
    fn default() -> Self {
        Self {
            logger: Arc::new(|message: &str| info!("{}", message)),
            size_formatter: Arc::new(|bytes: u64| format!("{} bytes", bytes)),
            total_reporter: Arc::new(|_: &str| {}),
        }
    }
}

impl fmt::Debug for ProgressCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressCallbacks").finish_non_exhaustive()
    }
}

/// Shared counter of bytes received across all in-flight requests
pub struct ProgressAggregator {
    total: Mutex<u64>,
    callbacks: ProgressCallbacks,
}

impl ProgressAggregator {
    /// Create an aggregator starting at zero
    pub fn new(callbacks: ProgressCallbacks) -> Self {
        Self {
            total: Mutex::new(0),
            callbacks,
        }
    }

    /// Start tracking a new request
    pub fn request(&self) -> RequestProgress<'_> {
        RequestProgress {
            aggregator: self,
            last_reported: AtomicU64::new(0),
        }
    }

    /// Total bytes received so far
    pub fn total(&self) -> u64 {
        *self.lock()
    }

    /// Add `delta` bytes and report the new total
    ///
    /// The report happens while the lock is held so reports leave in the
    /// same order the additions were applied. See [`ProgressCallbacks`] for
    /// what reporters may not do.
    pub fn add(&self, delta: u64) -> u64 {
        if delta == 0 {
            return self.total();
        }
        let mut total = self.lock();
        *total += delta;
        let formatted = self.callbacks.format_size(*total);
        (self.callbacks.total_reporter)(&formatted);
        *total
    }

    /// The collaborators this aggregator reports through
    pub fn callbacks(&self) -> &ProgressCallbacks {
        &self.callbacks
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, u64> {
        match self.total.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for ProgressAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressAggregator")
            .field("total", &self.total())
            .finish()
    }
}

/// Delta tracker for one request's cumulative progress events
pub struct RequestProgress<'a> {
    aggregator: &'a ProgressAggregator,
    last_reported: AtomicU64,
}

impl RequestProgress<'_> {
    /// Record that this request has now received `received` bytes in total
    ///
    /// Returns the aggregate total after applying the delta. Repeated or
    /// stale events contribute nothing.
    pub fn observe(&self, received: u64) -> u64 {
        let previous = self.last_reported.fetch_max(received, Ordering::SeqCst);
        self.aggregator.add(received.saturating_sub(previous))
    }

    /// Bytes this request has contributed
    pub fn received(&self) -> u64 {
        self.last_reported.load(Ordering::SeqCst)
    }
}

/// Completed/total counter for item-level progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemProgress {
    completed: usize,
    total: usize,
}

impl ItemProgress {
    pub fn new(total: usize) -> Self {
        Self { completed: 0, total }
    }

    /// Count one more completed item
    pub fn record_completion(&mut self) {
        self.completed = (self.completed + 1).min(self.total);
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Whole-number percentage, rounded down
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        (self.completed as u64 * 100) / self.total as u64
    }

    /// Status line for a finished asset
    pub fn asset_message(&self, asset: &str) -> String {
        format!(
            "{} Downloading Asset... {}% ({}/{}) {}",
            render_progress_bar(self.completed as u64, self.total as u64),
            self.percent(),
            self.completed,
            self.total,
            asset
        )
    }
}

/// Render a fixed-width bar such as `[=========>          ]`
pub fn render_progress_bar(completed: u64, total: u64) -> String {
    render_progress_bar_with_width(completed, total, BAR_WIDTH)
}

/// Render a bar of `width` cells between brackets
pub fn render_progress_bar_with_width(completed: u64, total: u64, width: usize) -> String {
    if total == 0 || completed >= total {
        return format!("[{}]", "=".repeat(width));
    }
    if completed == 0 {
        return format!("[{}]", " ".repeat(width));
    }
    let fraction = completed as f64 / total as f64;
    let filled = ((fraction * width as f64).ceil() as usize)
        .saturating_sub(1)
        .min(width.saturating_sub(1));
    format!(
        "[{}>{}]",
        "=".repeat(filled),
        " ".repeat(width - filled - 1)
    )
}
