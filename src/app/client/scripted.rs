//! In-memory fetcher replaying canned responses per URL
//!
//! Useful for offline runs and tests. Each URL holds a queue of responses;
//! the last queued response repeats once the others are consumed. Unknown
//! URLs answer 404.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{ByteFetcher, FetchedBody, ProgressCallback};
use crate::errors::{FetchError, FetchResult};

/// One canned response
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Complete body delivered in chunks of `chunk_size` bytes
    Body {
        status: u16,
        bytes: Bytes,
        chunk_size: usize,
        declare_length: bool,
    },
    /// Connection fails before any byte arrives
    TransportError(String),
    /// Some bytes arrive, then the connection drops
    Truncated { delivered: Bytes, message: String },
}

impl ScriptedResponse {
    /// 200 response delivered in a single chunk with a declared length
    pub fn ok(bytes: impl Into<Bytes>) -> Self {
        Self::Body {
            status: 200,
            bytes: bytes.into(),
            chunk_size: usize::MAX,
            declare_length: true,
        }
    }

    /// Response with the given status and an empty body
    pub fn status(status: u16) -> Self {
        Self::Body {
            status,
            bytes: Bytes::new(),
            chunk_size: usize::MAX,
            declare_length: true,
        }
    }

    /// Transport failure
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self::TransportError(message.into())
    }

    /// Deliver `delivered` bytes, then fail with a transport error
    pub fn truncated(delivered: impl Into<Bytes>, message: impl Into<String>) -> Self {
        Self::Truncated {
            delivered: delivered.into(),
            message: message.into(),
        }
    }

    /// Split the body into chunks of `chunk_size` bytes
    pub fn chunked(mut self, size: usize) -> Self {
        if let Self::Body { chunk_size, .. } = &mut self {
            *chunk_size = size.max(1);
        }
        self
    }

    /// Omit the content length from progress events
    pub fn without_length(mut self) -> Self {
        if let Self::Body { declare_length, .. } = &mut self {
            *declare_length = false;
        }
        self
    }
}

#[derive(Debug, Default)]
struct Route {
    responses: VecDeque<ScriptedResponse>,
    requests: u32,
}

/// Fetcher backed by per-URL response queues
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Route>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`
    pub fn respond(&self, url: impl Into<String>, response: ScriptedResponse) -> &Self {
        self.with_routes(|routes| {
            routes
                .entry(url.into())
                .or_default()
                .responses
                .push_back(response);
        });
        self
    }

    /// Queue `failures` copies of `failure` followed by `success`
    pub fn respond_after_failures(
        &self,
        url: impl Into<String>,
        failures: u32,
        failure: ScriptedResponse,
        success: ScriptedResponse,
    ) -> &Self {
        let url = url.into();
        for _ in 0..failures {
            self.respond(url.clone(), failure.clone());
        }
        self.respond(url, success)
    }

    /// Number of requests issued for `url`
    pub fn request_count(&self, url: &str) -> u32 {
        self.with_routes(|routes| routes.get(url).map_or(0, |route| route.requests))
    }

    /// Total requests across every URL
    pub fn total_requests(&self) -> u32 {
        self.with_routes(|routes| routes.values().map(|route| route.requests).sum())
    }

    fn with_routes<T>(&self, f: impl FnOnce(&mut HashMap<String, Route>) -> T) -> T {
        let mut guard = match self.routes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn next_response(&self, url: &str) -> Option<ScriptedResponse> {
        self.with_routes(|routes| {
            let route = routes.entry(url.to_string()).or_default();
            route.requests += 1;
            if route.responses.len() > 1 {
                route.responses.pop_front()
            } else {
                route.responses.front().cloned()
            }
        })
    }
}

#[async_trait]
impl ByteFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, on_progress: ProgressCallback<'_>) -> FetchResult<FetchedBody> {
        // Yield so concurrent callers interleave the way real requests do
        tokio::task::yield_now().await;

        match self.next_response(url) {
            None => Ok(FetchedBody {
                bytes: Bytes::new(),
                status: 404,
            }),
            Some(ScriptedResponse::TransportError(message)) => Err(FetchError::Transport {
                url: url.to_string(),
                message,
            }),
            Some(ScriptedResponse::Truncated { delivered, message }) => {
                if !delivered.is_empty() {
                    on_progress(delivered.len() as u64, None);
                }
                Err(FetchError::Transport {
                    url: url.to_string(),
                    message,
                })
            }
            Some(ScriptedResponse::Body {
                status,
                bytes,
                chunk_size,
                declare_length,
            }) => {
                let total = declare_length.then_some(bytes.len() as u64);
                let mut received = 0_u64;
                for chunk in bytes.chunks(chunk_size) {
                    received += chunk.len() as u64;
                    on_progress(received, total);
                    tokio::task::yield_now().await;
                }
                Ok(FetchedBody { bytes, status })
            }
        }
    }
}
