//! Command-line argument parsing for SB3 Fetcher
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::constants::env;

/// SB3 Fetcher - Download Scratch projects as .sb3 archives
#[derive(Parser, Debug)]
#[command(
    name = "sb3_fetcher",
    version,
    about = "Download a Scratch project and its assets into a single .sb3 archive",
    long_about = "Fetches a project's descriptor and every costume and sound it references,
downloading assets concurrently with automatic retries, and packages them into one .sb3 file."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a project into an .sb3 archive
    Download(DownloadArgs),

    /// Write a default configuration file
    InitConfig(InitConfigArgs),
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Project id or project URL (the first run of digits is used)
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Project access token; skips the metadata lookup when given
    #[arg(short, long, env = env::PROJECT_TOKEN)]
    pub token: Option<String>,

    /// Directory to write the archive into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Attempts per asset before giving up
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Maximum concurrent asset downloads (0 = unbounded)
    #[arg(short, long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Reject assets whose content does not hash to their MD5 id
    #[arg(long)]
    pub verify: bool,

    /// Overwrite an existing archive
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for writing a default configuration
#[derive(Args, Debug, Clone)]
pub struct InitConfigArgs {
    /// Destination (defaults to the user config directory)
    #[arg(value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level chosen by flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl DownloadArgs {
    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == Some(0) {
            return Err("Number of attempts must be greater than 0".to_string());
        }

        if self.project.trim().is_empty() {
            return Err("A project id or URL is required".to_string());
        }

        Ok(())
    }

    /// Apply command-line overrides on top of loaded configuration
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(attempts) = self.max_attempts {
            config.downloader.max_attempts = attempts;
        }
        if let Some(limit) = self.concurrency {
            config.coordinator.max_concurrency = limit;
        }
        if self.verify {
            config.downloader.verify_checksums = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> DownloadArgs {
        DownloadArgs {
            project: "10128407".to_string(),
            token: None,
            output: PathBuf::from("."),
            max_attempts: None,
            concurrency: None,
            verify: false,
            force: false,
        }
    }

    #[test]
    fn test_download_args_validation() {
        let mut args = base_args();
        assert!(args.validate().is_ok());

        args.max_attempts = Some(0);
        assert!(args.validate().is_err());

        args.max_attempts = Some(3);
        args.project = "  ".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_overrides_applied_to_config() {
        let mut config = AppConfig::default();
        base_args().apply_to(&mut config);
        assert_eq!(config.downloader.max_attempts, 20);
        assert!(!config.downloader.verify_checksums);

        let args = DownloadArgs {
            max_attempts: Some(4),
            concurrency: Some(6),
            verify: true,
            ..base_args()
        };
        args.apply_to(&mut config);
        assert_eq!(config.downloader.max_attempts, 4);
        assert_eq!(config.coordinator.max_concurrency, 6);
        assert!(config.downloader.verify_checksums);
    }

    #[test]
    fn test_parse_download_command() {
        let cli = Cli::try_parse_from([
            "sb3_fetcher",
            "-v",
            "download",
            "https://scratch.mit.edu/projects/42",
            "--concurrency",
            "4",
            "--force",
        ])
        .unwrap();

        assert_eq!(cli.log_level(), Some(tracing::Level::INFO));
        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.project, "https://scratch.mit.edu/projects/42");
                assert_eq!(args.concurrency, Some(4));
                assert!(args.force);
                assert_eq!(args.output, PathBuf::from("."));
            }
            other => panic!("Expected download command, got {:?}", other),
        }
    }

    #[test]
    fn test_log_level() {
        let cli_quiet = Cli::try_parse_from(["sb3_fetcher", "--quiet", "init-config"]).unwrap();
        let cli_default = Cli::try_parse_from(["sb3_fetcher", "init-config"]).unwrap();

        assert_eq!(cli_quiet.log_level(), Some(tracing::Level::ERROR));
        assert_eq!(cli_default.log_level(), None);
    }
}
