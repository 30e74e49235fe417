//! SB3 Fetcher CLI application
//!
//! Command-line interface for downloading Scratch projects as .sb3 archives.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sb3_fetcher::cli::{handle_download, handle_init_config, Cli, Commands};
use sb3_fetcher::config::{AppConfig, LoggingConfig};
use sb3_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config.logging);
    info!("SB3 Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(args, config, cli.global.quiet).await
        }
        Commands::InitConfig(args) => {
            info!("Executing init-config command");
            handle_init_config(args).await
        }
    }
}

/// Initialize logging from CLI flags, falling back to the configured level
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = cli
        .log_level()
        .map_or_else(|| logging.level.clone(), |level| level.to_string().to_lowercase());

    let mut filter = EnvFilter::from_default_env();
    match format!("sb3_fetcher={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(logging.colored_output)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
