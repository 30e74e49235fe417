//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the reqwest
//! client shared by every descriptor, token and asset request.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, http};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the shared HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User agent sent with every request
    pub user_agent: String,
    /// TCP keep-alive settings
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout, covering the whole body transfer
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "client.request_timeout".to_string(),
                value: "0s".to_string(),
                reason: "Request timeout cannot be zero".to_string(),
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "client.connect_timeout".to_string(),
                value: "0s".to_string(),
                reason: "Connect timeout cannot be zero".to_string(),
            });
        }
        Ok(())
    }

    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> ConfigResult<Client> {
        self.validate()?;

        let mut client_builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(ConfigError::HttpClient)
    }
}

/// Base URLs of the remote content service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base serving project descriptors
    pub descriptor_base: String,
    /// Base serving project metadata for token resolution
    pub meta_base: String,
    /// Base serving binary assets
    pub asset_base: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            descriptor_base: endpoints::DESCRIPTOR_BASE_URL.to_string(),
            meta_base: endpoints::META_BASE_URL.to_string(),
            asset_base: endpoints::ASSET_BASE_URL.to_string(),
        }
    }
}

impl EndpointConfig {
    /// Point every endpoint at one host, as a test server would serve them
    pub fn with_root(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            descriptor_base: format!("{}/projects", root),
            meta_base: format!("{}/api/projects", root),
            asset_base: format!("{}/assets", root),
        }
    }

    /// `GET <descriptor-base>/{project_id}?token={token}`
    pub fn descriptor_url(&self, project_id: &str, token: &str) -> String {
        format!(
            "{}/{}?token={}",
            self.descriptor_base.trim_end_matches('/'),
            project_id,
            token
        )
    }

    /// `GET <meta-base>/{project_id}`
    pub fn meta_url(&self, project_id: &str) -> String {
        format!("{}/{}", self.meta_base.trim_end_matches('/'), project_id)
    }
}
