//! Command handlers for the CLI
//!
//! Each handler takes parsed arguments plus loaded configuration and runs
//! one command to completion.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::coordinator::spawn_signal_listener;
use crate::app::session::{extract_project_id, ProjectDownloader};
use crate::cli::args::{DownloadArgs, InitConfigArgs};
use crate::cli::progress::{format_file_size, ProgressDisplay};
use crate::config::AppConfig;
use crate::constants::files::TEMP_FILE_SUFFIX;
use crate::errors::{AppError, Result};

/// Handle the download command
pub async fn handle_download(args: DownloadArgs, mut config: AppConfig, quiet: bool) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    args.apply_to(&mut config);

    let project_id = extract_project_id(&args.project).ok_or_else(|| {
        AppError::generic(format!("No project id found in '{}'", args.project))
    })?;
    info!("Downloading project {}", project_id);

    let display = ProgressDisplay::new(quiet);
    let downloader = ProjectDownloader::from_config(&config, display.callbacks())?;

    let cancel = CancellationToken::new();
    let signals = spawn_signal_listener(cancel.clone());

    let result = downloader
        .download_with_cancel(&project_id, args.token.as_deref(), &cancel)
        .await;
    signals.abort();

    let project = match result {
        Ok(project) => {
            display.finish();
            project
        }
        Err(e) => {
            display.abandon();
            return Err(e);
        }
    };

    let destination = args.output.join(&project.filename);
    write_archive(&destination, project.archive.bytes.clone(), args.force).await?;

    if !quiet {
        println!("✅ Saved {}", destination.display());
        println!(
            "   {} assets, {} archive, {} received",
            project.stats.assets_completed,
            format_file_size(project.archive.size()),
            format_file_size(project.bytes_received)
        );
        if project.stats.retries() > 0 {
            println!("   {} retried requests", project.stats.retries());
        }
    }
    Ok(())
}

/// Handle the init-config command
pub async fn handle_init_config(args: InitConfigArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => AppConfig::default_config_path()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?,
    };

    AppConfig::write_default(&path, args.force).await?;
    println!("📁 Created default configuration file:");
    println!("   {}", path.display());
    Ok(())
}

/// Write `bytes` to `destination` through a temporary file in the same directory
///
/// The destination only ever holds a complete archive. An existing file is
/// kept unless `force` is set.
pub async fn write_archive(destination: &Path, bytes: Bytes, force: bool) -> Result<()> {
    let destination: PathBuf = destination.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        if destination.exists() && !force {
            return Err(AppError::generic(format!(
                "{} already exists (use --force to overwrite)",
                destination.display()
            )));
        }

        let directory = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&directory)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".sb3_fetcher")
            .suffix(TEMP_FILE_SUFFIX)
            .tempfile_in(&directory)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;

        if force {
            temp.persist(&destination).map_err(|e| AppError::Io(e.error))?;
        } else {
            temp.persist_noclobber(&destination)
                .map_err(|e| AppError::Io(e.error))?;
        }

        debug!("Wrote {} bytes to {}", bytes.len(), destination.display());
        Ok(())
    })
    .await
    .map_err(|e| AppError::generic(format!("Archive write task failed: {}", e)))?
}
