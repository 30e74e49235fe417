//! Byte-stream fetching for descriptor, token and asset requests
//!
//! Every network operation in the pipeline goes through the [`ByteFetcher`]
//! trait: one GET, incremental progress callbacks, and the final status code.
//! The fetcher itself never retries.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: reqwest-backed streaming fetcher
//! - `scripted`: in-memory fetcher replaying canned responses

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::{FetchError, FetchResult};

pub mod config;
pub mod http;
pub mod scripted;

pub use config::{ClientConfig, EndpointConfig};
pub use http::HttpFetcher;
pub use scripted::{ScriptedFetcher, ScriptedResponse};

/// Progress callback receiving `(bytes_received_so_far, total_if_declared)`
pub type ProgressCallback<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Progress callback that ignores every event
pub fn no_progress(_received: u64, _total: Option<u64>) {}

/// Completed response body and its status code
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Bytes,
    pub status: u16,
}

impl FetchedBody {
    /// Whether the status is within [200, 300)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return the body, or an `HttpStatus` error for non-success responses
    pub fn into_success(self, url: &str) -> FetchResult<Bytes> {
        if self.is_success() {
            Ok(self.bytes)
        } else {
            Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// A single-shot HTTP GET that reports bytes as they arrive
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    /// Fetch `url`, invoking `on_progress` after every received chunk
    ///
    /// Transport failures are returned as errors. Non-success status codes are
    /// returned in [`FetchedBody::status`] for the caller to judge.
    async fn fetch(&self, url: &str, on_progress: ProgressCallback<'_>) -> FetchResult<FetchedBody>;
}
