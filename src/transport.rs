//! HTTP transport seam
//!
//! The client only depends on the [`Transport`] trait. [`ReqwestTransport`]
//! is the default implementation; tests and proxies can inject their own.

use crate::config::{ClientConfig, API_KEY_HEADER};
use crate::error::{RemoveBgError, Result};
use crate::request::{PreparedRequest, RequestBody};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::multipart::{Form, Part};

/// Status, headers and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Header lookups are case-insensitive
    pub headers: HeaderMap,
    /// Body text. Valid UTF-8 is kept byte for byte; invalid sequences are
    /// replaced with U+FFFD (see [`decode_body`]).
    pub body: String,
}

impl RawResponse {
    pub fn new<S: Into<String>>(status: u16, body: S) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Sends a prepared request and returns the raw response
///
/// Implementations must not retry or reinterpret failures; any non-2xx
/// status is a normal `Ok(RawResponse)`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse>;
}

/// Default transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl ReqwestTransport {
    /// Create a transport from client configuration
    ///
    /// # Errors
    /// - Invalid endpoint URL
    /// - Failed to create HTTP client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            RemoveBgError::invalid_config(format!("Failed to create HTTP client: {}", e))
        })?;

        Self::with_client(client, &config.endpoint)
    }

    /// Use an existing `reqwest::Client` (shared connection pool, custom TLS, proxies)
    pub fn with_client(client: reqwest::Client, endpoint: &str) -> Result<Self> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| {
            RemoveBgError::invalid_config(format!("Invalid endpoint '{}': {}", endpoint, e))
        })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse> {
        let builder = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, request.api_key)
            .header(ACCEPT, "application/json");

        let builder = match request.body {
            // `.json()` also sets Content-Type: application/json
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart {
                fields,
                file_name,
                file_bytes,
            } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                let part = Part::bytes(file_bytes).file_name(file_name);
                builder.multipart(form.part("image_file", part))
            },
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = decode_body(&response.bytes().await?);

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decode a response body to text
///
/// Valid UTF-8 is returned unchanged, ignoring any `charset` the server
/// declares. Invalid sequences become U+FFFD.
pub fn decode_body(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::debug!(len = bytes.len(), "Response body is not valid UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        },
    }
}
