//! SB3 Fetcher Library
//!
//! Downloads a Scratch project descriptor and every asset it references, then
//! packages them into a single `.sb3` archive. Asset downloads run
//! concurrently with per-asset retries and a fixed backoff schedule.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(DEFAULT_MAX_ATTEMPTS, 20);
        assert_eq!(ENV_PROJECT_TOKEN, "SB3_FETCHER_TOKEN");
        assert_eq!(DESCRIPTOR_ENTRY, "project.json");
        assert!(USER_AGENT.contains("SB3-Fetcher"));
    }

    #[test]
    fn test_error_types() {
        let error = errors::DescriptorError::Parse {
            reason: "unexpected end of input".to_string(),
        };
        let app_error = AppError::Descriptor(error);

        assert_eq!(app_error.category(), "descriptor");
        assert!(!app_error.is_recoverable());
    }
}
