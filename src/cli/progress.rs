//! Terminal progress display for project downloads
//!
//! Status lines from the pipeline land on an indicatif spinner, and the
//! running byte total sits on a second line underneath. Without a terminal
//! every status line is written to stderr as-is; quiet mode drops them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sb3_fetcher::cli::ProgressDisplay;
//!
//! let display = ProgressDisplay::new(false);
//! let callbacks = display.callbacks();
//! callbacks.log("Downloading project.json... (512 Bytes downloaded)");
//! display.finish();
//! ```

use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::app::progress::ProgressCallbacks;

/// Human-readable size in Bytes, KB or MB with two decimals
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes < KIB {
        format!("{} Bytes", bytes)
    } else if bytes < MIB {
        format!("{:.2} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}

#[derive(Clone)]
enum DisplayMode {
    Terminal {
        multi: MultiProgress,
        status: ProgressBar,
        total: ProgressBar,
    },
    Text,
    Quiet,
}

/// Progress display manager
#[derive(Clone)]
pub struct ProgressDisplay {
    mode: DisplayMode,
}

impl ProgressDisplay {
    /// Pick a display for the current stderr
    pub fn new(quiet: bool) -> Self {
        if quiet {
            Self::quiet()
        } else if atty::is(atty::Stream::Stderr) {
            Self::terminal(ProgressDrawTarget::stderr())
        } else {
            Self::text()
        }
    }

    /// Progress bars drawn to `target`
    pub fn terminal(target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let status = multi.add(ProgressBar::new_spinner());
        status.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        status.enable_steady_tick(Duration::from_millis(100));
        status.set_message("Starting...");

        let total = multi.add(ProgressBar::new_spinner());
        total.set_style(
            ProgressStyle::default_spinner()
                .template("  Total downloaded: {msg:.cyan}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        total.set_message(format_file_size(0));

        Self {
            mode: DisplayMode::Terminal {
                multi,
                status,
                total,
            },
        }
    }

    /// Plain status lines on stderr
    pub fn text() -> Self {
        Self {
            mode: DisplayMode::Text,
        }
    }

    /// No progress output at all
    pub fn quiet() -> Self {
        Self {
            mode: DisplayMode::Quiet,
        }
    }

    /// Callbacks feeding this display
    pub fn callbacks(&self) -> ProgressCallbacks {
        let logger = {
            let display = self.clone();
            Arc::new(move |line: &str| display.log(line))
        };
        let total_reporter = {
            let display = self.clone();
            Arc::new(move |formatted: &str| display.report_total(formatted))
        };

        ProgressCallbacks::new(logger, Arc::new(format_file_size), total_reporter)
    }

    /// Show one status line
    ///
    /// Multi-line messages are printed above the bars so they stay visible.
    pub fn log(&self, line: &str) {
        match &self.mode {
            DisplayMode::Terminal { multi, status, .. } => {
                if line.contains('\n') {
                    let _ = multi.println(line);
                } else {
                    status.set_message(line.to_string());
                }
            }
            DisplayMode::Text => eprintln!("{}", line),
            DisplayMode::Quiet => {}
        }
    }

    /// Update the running total line
    pub fn report_total(&self, formatted: &str) {
        if let DisplayMode::Terminal { total, .. } = &self.mode {
            total.set_message(formatted.to_string());
        }
    }

    /// Current status line, if the display keeps one
    pub fn status_message(&self) -> Option<String> {
        match &self.mode {
            DisplayMode::Terminal { status, .. } => Some(status.message()),
            _ => None,
        }
    }

    /// Current total line, if the display keeps one
    pub fn total_message(&self) -> Option<String> {
        match &self.mode {
            DisplayMode::Terminal { total, .. } => Some(total.message()),
            _ => None,
        }
    }

    /// Leave the final state on screen
    pub fn finish(&self) {
        if let DisplayMode::Terminal { status, total, .. } = &self.mode {
            status.finish_and_clear();
            total.finish();
        }
    }

    /// Stop drawing after a failure
    pub fn abandon(&self) {
        if let DisplayMode::Terminal { status, total, .. } = &self.mode {
            status.abandon();
            total.abandon();
        }
    }
}
