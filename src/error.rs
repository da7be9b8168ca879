//! Error types for remove.bg API calls

use crate::response::RateLimit;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for remove.bg operations
pub type Result<T> = std::result::Result<T, RemoveBgError>;

/// A single structured error entry returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Machine-readable error code (e.g. `unknown_foreground`), when the API sends one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorDetail {
    pub fn new<T: Into<String>, D: Into<String>>(title: T, detail: D) -> Self {
        Self {
            title: title.into(),
            detail: Some(detail.into()),
            code: None,
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.title, detail),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Body of a non-200 response
///
/// The API normally answers with `{"errors": [{"title": ..., "detail": ...}]}`.
/// Anything else is kept verbatim in `Raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorBody {
    Errors(Vec<ErrorDetail>),
    /// Body text as received; a non-UTF-8 body is decoded lossily
    Raw(String),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    errors: Vec<ErrorDetail>,
}

impl ApiErrorBody {
    /// Normalize a raw error body
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self::Errors(envelope.errors),
            Err(_) => Self::Raw(body.to_string()),
        }
    }

    /// Structured entries, if the body had them
    pub fn errors(&self) -> Option<&[ErrorDetail]> {
        match self {
            Self::Errors(errors) => Some(errors),
            Self::Raw(_) => None,
        }
    }
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Errors(errors) => {
                let joined = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{}", joined)
            },
            Self::Raw(body) if body.is_empty() => write!(f, "<empty body>"),
            Self::Raw(body) => write!(f, "{}", body),
        }
    }
}

/// Error types for remove.bg operations
#[derive(Error, Debug)]
pub enum RemoveBgError {
    /// Local input/output errors (input file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid client configuration (missing API key, bad endpoint)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Conflicting or malformed processing options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The API answered with a non-200 status
    ///
    /// `rate_limit` carries whatever rate-limit headers came with the
    /// response (e.g. `Retry-After` on HTTP 429) so callers can schedule
    /// their own retry.
    #[error("API error (HTTP {status}): {body}")]
    Api {
        status: u16,
        body: ApiErrorBody,
        rate_limit: RateLimit,
    },

    /// Network-level failure from the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 200 response that is missing the image or carries unparseable metadata
    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },

    /// The result image was not valid base64
    #[error("Failed to decode result image: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Writing the result image to disk failed
    #[error("Failed to write output file '{}': {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RemoveBgError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid options error
    pub fn invalid_options<S: Into<String>>(msg: S) -> Self {
        Self::InvalidOptions(msg.into())
    }

    /// Create a new malformed response error
    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// True for failures raised before any request left the process
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::InvalidConfig(_) | Self::InvalidOptions(_)
        )
    }

    /// True when the API itself rejected the request
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Structured API error entries, if any
    pub fn api_errors(&self) -> Option<&[ErrorDetail]> {
        match self {
            Self::Api { body, .. } => body.errors(),
            _ => None,
        }
    }
}
