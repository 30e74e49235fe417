//! Project descriptor loading and asset resolution
//!
//! The descriptor is the structured document describing a project. It is
//! fetched once (after resolving an access token when none was supplied),
//! decoded from JSON text or a zip container, and kept read-only for the
//! rest of the operation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sb3_fetcher::app::client::{ClientConfig, EndpointConfig, HttpFetcher};
//! use sb3_fetcher::app::descriptor::DescriptorLoader;
//! use sb3_fetcher::app::progress::{ProgressAggregator, ProgressCallbacks};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpFetcher::new(ClientConfig::default().build_http_client()?));
//! let loader = DescriptorLoader::new(fetcher, EndpointConfig::default());
//! let progress = ProgressAggregator::new(ProgressCallbacks::default());
//!
//! let loaded = loader.load("10128407", None, &progress).await?;
//! println!("{} assets", loaded.descriptor.asset_references().len());
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod container;
pub mod token;

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, info};

use crate::app::client::{ByteFetcher, EndpointConfig};
use crate::app::models::{ArchiveEntry, AssetReference};
use crate::app::progress::{render_progress_bar, ProgressAggregator, ProgressCallbacks};
use crate::errors::{DescriptorError, DescriptorResult};

pub use assets::{reference_from_record, resolve_assets};
pub use container::{decode_descriptor_text, extract_entry, looks_like_json};
pub use token::TokenResolver;

/// Parsed, read-only project descriptor
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    text: String,
    value: Value,
}

impl ProjectDescriptor {
    /// Parse descriptor JSON text
    ///
    /// The document must be an object whose `targets` field is an array.
    pub fn from_text(text: impl Into<String>) -> DescriptorResult<Self> {
        let text = text.into();
        let value: Value = serde_json::from_str(&text).map_err(|e| DescriptorError::Parse {
            reason: e.to_string(),
        })?;

        match value.get("targets") {
            Some(Value::Array(_)) => Ok(Self { text, value }),
            Some(_) => Err(DescriptorError::Parse {
                reason: "\"targets\" is not an array".to_string(),
            }),
            None => Err(DescriptorError::Parse {
                reason: "missing \"targets\" array".to_string(),
            }),
        }
    }

    /// Decode a raw payload (JSON text or zip container) and parse it
    pub fn from_payload(payload: &[u8]) -> DescriptorResult<Self> {
        Self::from_text(decode_descriptor_text(payload)?)
    }

    /// Targets (stage and sprites) in document order
    pub fn targets(&self) -> &[Value] {
        self.value
            .get("targets")
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Unique asset references in order of first appearance
    pub fn asset_references(&self) -> Vec<AssetReference> {
        resolve_assets(self.targets())
    }

    /// The descriptor as decoded text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The descriptor as structured data
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Archive entry holding the UTF-8 descriptor
    pub fn archive_entry(&self) -> ArchiveEntry {
        ArchiveEntry::descriptor(Bytes::from(self.text.clone()))
    }
}

/// A descriptor together with the title learned while loading it
#[derive(Debug, Clone)]
pub struct LoadedDescriptor {
    pub descriptor: ProjectDescriptor,
    /// Present only when the token was resolved through the metadata lookup
    pub title: Option<String>,
}

/// Fetches and decodes project descriptors
#[derive(Clone)]
pub struct DescriptorLoader {
    fetcher: Arc<dyn ByteFetcher>,
    endpoints: EndpointConfig,
    resolver: TokenResolver,
}

impl DescriptorLoader {
    pub fn new(fetcher: Arc<dyn ByteFetcher>, endpoints: EndpointConfig) -> Self {
        let resolver = TokenResolver::new(fetcher.clone(), endpoints.clone());
        Self {
            fetcher,
            endpoints,
            resolver,
        }
    }

    /// Load the descriptor of `project_id`
    ///
    /// When `token` is `None` the token (and title) are resolved first. Bytes
    /// received count toward `progress`, and a status line is logged for each
    /// progress event.
    pub async fn load(
        &self,
        project_id: &str,
        token: Option<&str>,
        progress: &ProgressAggregator,
    ) -> DescriptorResult<LoadedDescriptor> {
        let (token, title) = match token {
            Some(token) => (token.to_string(), None),
            None => {
                let metadata = self.resolver.resolve(project_id).await?;
                (metadata.project_token, metadata.title)
            }
        };

        let url = self.endpoints.descriptor_url(project_id, &token);
        debug!("Fetching descriptor for project {}", project_id);

        let request = progress.request();
        let callbacks = progress.callbacks();
        let on_progress = |received: u64, total: Option<u64>| {
            request.observe(received);
            callbacks.log(&descriptor_progress_message(received, total, callbacks));
        };

        let body = self
            .fetcher
            .fetch(&url, &on_progress)
            .await
            .map_err(|e| DescriptorError::Fetch {
                reason: e.to_string(),
            })?;
        request.observe(body.bytes.len() as u64);

        if !body.is_success() {
            return Err(DescriptorError::Fetch {
                reason: format!("HTTP {}", body.status),
            });
        }

        let descriptor = ProjectDescriptor::from_payload(&body.bytes)?;
        info!(
            "Loaded descriptor for project {} ({} bytes, {} targets)",
            project_id,
            body.bytes.len(),
            descriptor.targets().len()
        );

        Ok(LoadedDescriptor { descriptor, title })
    }
}

impl std::fmt::Debug for DescriptorLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorLoader")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// Status line for descriptor download progress
pub fn descriptor_progress_message(
    received: u64,
    total: Option<u64>,
    callbacks: &ProgressCallbacks,
) -> String {
    match total {
        Some(total) if total > 0 => format!(
            "{} Downloading project.json... {:.2}% ({}/{})",
            render_progress_bar(received, total),
            received as f64 / total as f64 * 100.0,
            callbacks.format_size(received),
            callbacks.format_size(total)
        ),
        _ => format!(
            "Downloading project.json... ({} downloaded)",
            callbacks.format_size(received)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::app::client::{ScriptedFetcher, ScriptedResponse};

    const DESCRIPTOR: &str = r#"{"targets":[{"name":"Stage","costumes":[{"md5ext":"bg.svg"}],"sounds":[]}],"meta":{"semver":"3.0.0"}}"#;

    fn recording_progress() -> (ProgressAggregator, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let callbacks = ProgressCallbacks::new(
            Arc::new(move |line: &str| sink.lock().unwrap().push(line.to_string())),
            Arc::new(|bytes: u64| format!("{}B", bytes)),
            Arc::new(|_: &str| {}),
        );
        (ProgressAggregator::new(callbacks), lines)
    }

    fn loader(fetcher: Arc<ScriptedFetcher>) -> DescriptorLoader {
        DescriptorLoader::new(fetcher, EndpointConfig::with_root("https://test"))
    }

    #[test]
    fn test_descriptor_requires_targets_array() {
        assert!(ProjectDescriptor::from_text(DESCRIPTOR).is_ok());
        assert!(matches!(
            ProjectDescriptor::from_text(r#"{"targets":{}}"#),
            Err(DescriptorError::Parse { .. })
        ));
        assert!(matches!(
            ProjectDescriptor::from_text(r#"{"objName":"Stage"}"#),
            Err(DescriptorError::Parse { .. })
        ));
        assert!(matches!(
            ProjectDescriptor::from_text("{not json"),
            Err(DescriptorError::Parse { .. })
        ));
    }

    #[test]
    fn test_archive_entry_keeps_text() {
        let descriptor = ProjectDescriptor::from_text(DESCRIPTOR).unwrap();
        let entry = descriptor.archive_entry();
        assert_eq!(entry.name, "project.json");
        assert_eq!(entry.bytes, Bytes::from_static(DESCRIPTOR.as_bytes()));
        assert_eq!(descriptor.asset_references(), vec![AssetReference::new("bg", "svg")]);
    }

    #[tokio::test]
    async fn test_load_with_supplied_token_skips_lookup() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(
            "https://test/projects/7?token=abc",
            ScriptedResponse::ok(DESCRIPTOR).chunked(40),
        );
        let (progress, lines) = recording_progress();

        let loaded = loader(fetcher.clone())
            .load("7", Some("abc"), &progress)
            .await
            .unwrap();

        assert!(loaded.title.is_none());
        assert_eq!(fetcher.request_count("https://test/api/projects/7"), 0);
        assert_eq!(progress.total(), DESCRIPTOR.len() as u64);

        let lines = lines.lock().unwrap();
        assert!(!lines.is_empty());
        assert!(lines
            .last()
            .unwrap()
            .ends_with(&format!("100.00% ({0}B/{0}B)", DESCRIPTOR.len())));
    }

    #[tokio::test]
    async fn test_load_resolves_token_and_title() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(
            "https://test/api/projects/7",
            ScriptedResponse::ok(r#"{"project_token":"resolved","title":"Pong"}"#),
        );
        fetcher.respond(
            "https://test/projects/7?token=resolved",
            ScriptedResponse::ok(DESCRIPTOR).without_length(),
        );
        let (progress, lines) = recording_progress();

        let loaded = loader(fetcher).load("7", None, &progress).await.unwrap();

        assert_eq!(loaded.title.as_deref(), Some("Pong"));
        assert_eq!(
            lines.lock().unwrap().last().unwrap(),
            &format!("Downloading project.json... ({}B downloaded)", DESCRIPTOR.len())
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("https://test/projects/7?token=abc", ScriptedResponse::status(403));
        let (progress, _) = recording_progress();

        match loader(fetcher).load("7", Some("abc"), &progress).await {
            Err(DescriptorError::Fetch { reason }) => assert_eq!(reason, "HTTP 403"),
            other => panic!("Expected Fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_token_failure_aborts_before_descriptor() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("https://test/api/projects/7", ScriptedResponse::status(500));
        let (progress, _) = recording_progress();

        let result = loader(fetcher.clone()).load("7", None, &progress).await;
        assert!(matches!(result, Err(DescriptorError::TokenResolution { .. })));
        assert_eq!(fetcher.total_requests(), 1);
    }

    #[tokio::test]
    async fn test_malformed_descriptor_is_parse_error() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("https://test/projects/7?token=abc", ScriptedResponse::ok("{\"targets\": ["));
        let (progress, _) = recording_progress();

        assert!(matches!(
            loader(fetcher).load("7", Some("abc"), &progress).await,
            Err(DescriptorError::Parse { .. })
        ));
    }

    #[test]
    fn test_descriptor_progress_message_formats() {
        let callbacks = ProgressCallbacks::new(
            Arc::new(|_: &str| {}),
            Arc::new(|bytes: u64| format!("{}B", bytes)),
            Arc::new(|_: &str| {}),
        );
        assert_eq!(
            descriptor_progress_message(50, Some(200), &callbacks),
            format!("[{}>{}] Downloading project.json... 25.00% (50B/200B)", "=".repeat(4), " ".repeat(15))
        );
        assert_eq!(
            descriptor_progress_message(50, None, &callbacks),
            "Downloading project.json... (50B downloaded)"
        );
        assert_eq!(
            descriptor_progress_message(0, Some(0), &callbacks),
            "Downloading project.json... (0B downloaded)"
        );
    }
}
