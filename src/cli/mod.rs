//! Command-line interface components
//!
//! This module contains CLI-specific code for the SB3 Fetcher application,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, DownloadArgs, GlobalArgs, InitConfigArgs};
pub use commands::{handle_download, handle_init_config, write_archive};
pub use progress::{format_file_size, ProgressDisplay};
