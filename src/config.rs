//! Client configuration

use crate::error::{RemoveBgError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed remove.bg endpoint shared by all three input modes
pub const DEFAULT_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Default `User-Agent` sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("removebg-rs/", env!("CARGO_PKG_VERSION"));

/// Configuration for a [`Client`](crate::Client)
///
/// The API key is never serialized and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// remove.bg API key (mandatory)
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// Endpoint URL (default: the public remove.bg endpoint)
    pub endpoint: String,

    /// Overall request timeout handed to the HTTP client (None = no timeout)
    pub timeout: Option<Duration>,

    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use removebg::ClientConfig;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::builder()
    ///     .api_key("my-api-key")
    ///     .timeout(Duration::from_secs(60))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.endpoint, "https://api.remove.bg/v1.0/removebg");
    /// ```
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Shorthand for a config with only an API key
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    /// - Empty or whitespace-only API key
    /// - Endpoint that is not an absolute `http`/`https` URL
    /// - Zero timeout
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(RemoveBgError::invalid_config("API key is required"));
        }

        let endpoint = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            RemoveBgError::invalid_config(format!("Invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RemoveBgError::invalid_config(format!(
                "Endpoint must use http or https: {}",
                self.endpoint
            )));
        }

        if self.timeout == Some(Duration::ZERO) {
            return Err(RemoveBgError::invalid_config("Timeout must be greater than zero"));
        }

        Ok(())
    }
}

/// Builder for `ClientConfig`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    #[must_use]
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration with validation
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
