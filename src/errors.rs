//! Error types for SB3 Fetcher
//!
//! This module defines the error taxonomy for every stage of a project download.
//! Transport and status failures are retryable and stay inside the retrying
//! downloader; everything else is fatal and reaches the caller unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single HTTP request
#[derive(Error, Debug)]
pub enum FetchError {
    /// DNS, connection reset, timeout or body read failure
    #[error("Transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// Server answered with a status outside [200, 300)
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// URL could not be parsed
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },
}

impl FetchError {
    /// Build a transport error from a reqwest failure
    pub fn transport(url: impl Into<String>, error: &reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            message: error.to_string(),
        }
    }

    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }
}

/// Asset download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Every attempt failed
    #[error("Failed after {attempts} attempts: {url}")]
    ExhaustedRetries { url: String, attempts: u32 },

    /// The download was abandoned because the operation was cancelled
    #[error("Download cancelled: {url}")]
    Cancelled { url: String },

    /// Received bytes do not hash to the asset id
    #[error("Checksum mismatch for {asset}. Expected: {expected}, got: {actual}")]
    ChecksumMismatch {
        asset: String,
        expected: String,
        actual: String,
    },

    /// A download task panicked or was aborted
    #[error("Download task failed: {reason}")]
    TaskFailed { reason: String },

    /// Retryable request failure
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Descriptor loading errors
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Token lookup returned a non-success response or an unusable body
    #[error("Failed to fetch project API: {reason}")]
    TokenResolution { reason: String },

    /// Descriptor request failed or returned a non-success status
    #[error("Failed to fetch project descriptor: {reason}")]
    Fetch { reason: String },

    /// Descriptor payload is not valid structured data
    #[error("Failed to parse project descriptor: {reason}")]
    Parse { reason: String },

    /// Container payload could not be opened
    #[error("Descriptor container is not a readable archive: {reason}")]
    InvalidContainer { reason: String },

    /// Container payload lacks the descriptor entry
    #[error("Descriptor container has no {entry} entry")]
    MissingContainerEntry { entry: String },
}

/// Archive assembly errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Finalization requested before every expected entry arrived
    #[error("Archive incomplete: {} entries missing ({})", .missing.len(), .missing.join(", "))]
    Incomplete { missing: Vec<String> },

    /// The same entry name was added twice
    #[error("Duplicate archive entry: {name}")]
    DuplicateEntry { name: String },

    /// An entry outside the expected set was added
    #[error("Unexpected archive entry: {name}")]
    UnexpectedEntry { name: String },

    /// Zip encoder failure
    #[error("Archive encoding failed")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error while writing entries
    #[error("Archive I/O error")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be written
    #[error("Failed to write configuration file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client")]
    HttpClient(#[from] reqwest::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Request error that escaped the retry loop
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Descriptor error
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Archive error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(e) | AppError::Download(DownloadError::Fetch(e)) => e.is_retryable(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "network",
            AppError::Download(_) => "download",
            AppError::Descriptor(_) => "descriptor",
            AppError::Archive(_) => "archive",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Descriptor result type alias
pub type DescriptorResult<T> = std::result::Result<T, DescriptorError>;

/// Archive result type alias
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_retries_message_names_url_and_attempts() {
        let error = DownloadError::ExhaustedRetries {
            url: "https://example.com/a/get/".to_string(),
            attempts: 20,
        };
        assert_eq!(
            error.to_string(),
            "Failed after 20 attempts: https://example.com/a/get/"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        let status = AppError::Fetch(FetchError::HttpStatus {
            url: "u".to_string(),
            status: 503,
        });
        assert!(status.is_recoverable());
        assert_eq!(status.category(), "network");

        let exhausted = AppError::Download(DownloadError::ExhaustedRetries {
            url: "u".to_string(),
            attempts: 3,
        });
        assert!(!exhausted.is_recoverable());

        let parse = AppError::Descriptor(DescriptorError::Parse {
            reason: "eof".to_string(),
        });
        assert!(!parse.is_recoverable());
        assert_eq!(parse.category(), "descriptor");
    }

    #[test]
    fn test_incomplete_archive_lists_missing_entries() {
        let error = ArchiveError::Incomplete {
            missing: vec!["a.png".to_string(), "b.wav".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Archive incomplete: 2 entries missing (a.png, b.wav)"
        );
    }
}
