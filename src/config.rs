//! # Client Configuration Module
//!
//! Connection settings for the knowledge-base HTTP client: where the server
//! lives, how to authenticate, and how patient to be with it. Uses a builder
//! so callers only spell out what differs from the defaults.
//!
//! ## Key Components
//!
//! - `ClientConfig`: resolved settings consumed by `HttpClient`
//! - `ClientConfigBuilder`: builder for `ClientConfig`

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Default server address of a locally running knowledge-base service
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5300";

/// Environment variable holding the server address
pub const BASE_URL_ENV: &str = "KBVIEW_BASE_URL";

/// Environment variable holding the bearer token
pub const TOKEN_ENV: &str = "KBVIEW_TOKEN";

/// Configuration for the knowledge-base client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, without the API prefix
    pub base_url: String,

    /// Bearer token sent in the `Authorization` header
    pub token: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Whether to retry requests answered with HTTP 429
    pub retry_on_rate_limit: bool,

    /// Maximum number of retries for rate-limited requests
    pub max_retries: u32,

    /// Retry delay in seconds when no `Retry-After` header is present
    pub default_retry_after_secs: u64,

    /// User agent to use for requests
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_secs: 120,
            retry_on_rate_limit: true,
            max_retries: 3,
            default_retry_after_secs: 2,
            user_agent: format!("kbview/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set the server base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the bearer token
    pub fn token(mut self, token: Option<String>) -> Self {
        self.config.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set whether rate-limited requests are retried
    pub fn retry_on_rate_limit(mut self, retry: bool) -> Self {
        self.config.retry_on_rate_limit = retry;
        self
    }

    /// Set the maximum number of retries
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the fallback retry delay in seconds
    pub fn default_retry_after_secs(mut self, secs: u64) -> Self {
        self.config.default_retry_after_secs = secs;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration, validating the base URL
    pub fn build(self) -> Result<ClientConfig> {
        let mut config = self.config;
        let trimmed = config.base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&trimmed)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", trimmed, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported URL scheme '{}' (expected http or https)",
                parsed.scheme()
            )));
        }
        config.base_url = trimmed;
        Ok(config)
    }
}

impl ClientConfig {
    /// Create a new builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Build a configuration from `KBVIEW_BASE_URL` and `KBVIEW_TOKEN`
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::builder()
            .base_url(base_url)
            .token(std::env::var(TOKEN_ENV).ok())
            .build()
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
