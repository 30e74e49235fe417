//! Application constants for SB3 Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Environment variable supplying a project access token
    pub const PROJECT_TOKEN: &str = "SB3_FETCHER_TOKEN";
}

/// Remote service endpoints
pub mod endpoints {
    /// Base URL serving project descriptors (`{base}/{project_id}?token={token}`)
    pub const DESCRIPTOR_BASE_URL: &str = "https://projects.scratch.mit.edu";

    /// Base URL serving project metadata used for token resolution (`{base}/{project_id}`)
    pub const META_BASE_URL: &str = "https://trampoline.turbowarp.org/api/projects";

    /// Base URL serving binary assets (`{base}/{asset}/get/`)
    pub const ASSET_BASE_URL: &str = "https://assets.scratch.mit.edu/internalapi/asset";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "SB3-Fetcher/0.1.0";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 32;
}

/// Retry policy for asset downloads
pub mod retry {
    use super::Duration;

    /// Default number of attempts per asset before giving up
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

    /// Backoff schedule: `(last attempt number in band, delay before next attempt)`.
    ///
    /// Attempt numbers beyond the final band reuse the final delay.
    pub const BACKOFF_SCHEDULE: [(u32, Duration); 4] = [
        (5, Duration::ZERO),
        (10, Duration::from_millis(500)),
        (15, Duration::from_millis(1000)),
        (20, Duration::from_millis(5000)),
    ];
}

/// Archive layout constants
pub mod archive {
    /// Entry name of the project descriptor inside the archive
    pub const DESCRIPTOR_ENTRY: &str = "project.json";

    /// File extension of the produced archive
    pub const ARCHIVE_EXTENSION: &str = "sb3";

    /// Deflate compression level used at finalization
    pub const COMPRESSION_LEVEL: i64 = 9;
}

/// Concurrency defaults
pub mod coordinator {
    /// Default concurrency limit (0 = every asset download starts immediately)
    pub const DEFAULT_MAX_CONCURRENCY: usize = 0;

    /// Upper bound accepted for a configured concurrency limit
    pub const MAX_CONCURRENCY_LIMIT: usize = 512;
}

/// Progress reporting
pub mod progress {
    /// Width of the rendered progress bar, excluding brackets
    pub const BAR_WIDTH: usize = 20;
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "sb3-fetcher.toml";

    /// Directory name under the user config dir
    pub const CONFIG_DIR_NAME: &str = "sb3-fetcher";
}

// Re-export commonly used constants for convenience
pub use archive::DESCRIPTOR_ENTRY;
pub use env::PROJECT_TOKEN as ENV_PROJECT_TOKEN;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use retry::DEFAULT_MAX_ATTEMPTS;
