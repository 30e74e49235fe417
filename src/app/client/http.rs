//! Streaming HTTP GET with incremental progress
//!
//! One request per call, no retries. The body is read chunk by chunk so the
//! caller can observe bytes as they arrive.

use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{ByteFetcher, FetchedBody, ProgressCallback};
use crate::errors::{FetchError, FetchResult};

/// reqwest-backed byte fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wrap an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, on_progress: ProgressCallback<'_>) -> FetchResult<FetchedBody> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, &e))?;

        let status = response.status().as_u16();
        let total = response.content_length();
        let mut buffer = BytesMut::with_capacity(total.unwrap_or(0) as usize);
        let mut received: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::transport(url, &e))?;
            received += chunk.len() as u64;
            buffer.extend_from_slice(&chunk);
            on_progress(received, total);
        }

        debug!("Fetched {} bytes from {} (HTTP {})", received, url, status);

        Ok(FetchedBody {
            bytes: buffer.freeze(),
            status,
        })
    }
}
