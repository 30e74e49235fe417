//! Project token resolution
//!
//! A single metadata request, no retries. The response carries the access
//! token needed by the descriptor endpoint and the project title.

use std::sync::Arc;

use tracing::debug;

use crate::app::client::{no_progress, ByteFetcher, EndpointConfig};
use crate::app::models::ProjectMetadata;
use crate::errors::{DescriptorError, DescriptorResult};

/// Looks up project metadata by id
#[derive(Clone)]
pub struct TokenResolver {
    fetcher: Arc<dyn ByteFetcher>,
    endpoints: EndpointConfig,
}

impl TokenResolver {
    pub fn new(fetcher: Arc<dyn ByteFetcher>, endpoints: EndpointConfig) -> Self {
        Self { fetcher, endpoints }
    }

    /// Fetch the token and title of `project_id`
    pub async fn resolve(&self, project_id: &str) -> DescriptorResult<ProjectMetadata> {
        let url = self.endpoints.meta_url(project_id);
        debug!("Resolving project token via {}", url);

        let body = self
            .fetcher
            .fetch(&url, &no_progress)
            .await
            .map_err(|e| DescriptorError::TokenResolution {
                reason: e.to_string(),
            })?;

        if !body.is_success() {
            return Err(DescriptorError::TokenResolution {
                reason: format!("HTTP {}", body.status),
            });
        }

        serde_json::from_slice(&body.bytes).map_err(|e| DescriptorError::TokenResolution {
            reason: format!("invalid metadata response: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::{ScriptedFetcher, ScriptedResponse};

    const META_URL: &str = "https://trampoline.turbowarp.org/api/projects/42";

    fn resolver(fetcher: Arc<ScriptedFetcher>) -> TokenResolver {
        TokenResolver::new(fetcher, EndpointConfig::default())
    }

    #[tokio::test]
    async fn test_resolves_token_and_title() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(
            META_URL,
            ScriptedResponse::ok(r#"{"project_token":"tok-1","title":"My Game","id":42}"#),
        );

        let metadata = resolver(fetcher.clone()).resolve("42").await.unwrap();
        assert_eq!(metadata.project_token, "tok-1");
        assert_eq!(metadata.title.as_deref(), Some("My Game"));
        assert_eq!(fetcher.request_count(META_URL), 1);
    }

    #[tokio::test]
    async fn test_non_success_is_not_retried() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(META_URL, ScriptedResponse::status(404));

        match resolver(fetcher.clone()).resolve("42").await {
            Err(DescriptorError::TokenResolution { reason }) => assert_eq!(reason, "HTTP 404"),
            other => panic!("Expected TokenResolution, got {:?}", other),
        }
        assert_eq!(fetcher.request_count(META_URL), 1);
    }

    #[tokio::test]
    async fn test_malformed_metadata() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(META_URL, ScriptedResponse::ok(r#"{"title":"no token"}"#));

        assert!(matches!(
            resolver(fetcher).resolve("42").await,
            Err(DescriptorError::TokenResolution { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(META_URL, ScriptedResponse::transport_error("dns"));

        assert!(matches!(
            resolver(fetcher).resolve("42").await,
            Err(DescriptorError::TokenResolution { .. })
        ));
    }
}
