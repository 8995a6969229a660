//! Error types for kintone client operations

use std::path::PathBuf;

use compact_str::CompactString;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Structured error types for kintone client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// A `/k/v1/` path was requested before any domain was configured
    #[error("No kintone domain configured; call set_subdomain or set_domain first")]
    MissingDomain,

    /// Client settings are invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {}", status_message(.message, .body))]
    Status {
        status: StatusCode,
        body: String,
        /// `message` of a kintone error body, when the body has that shape
        message: Option<CompactString>,
    },

    /// JSON parsing error with endpoint context
    #[error("Failed to parse JSON response from {endpoint}")]
    JsonParse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading the file to upload failed
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error body returned by kintone, e.g.
/// `{"code":"GAIA_IL23","id":"...","message":"..."}`
#[derive(Debug, Deserialize)]
struct KintoneApiError {
    message: CompactString,
}

fn status_message<'a>(message: &'a Option<CompactString>, body: &'a str) -> &'a str {
    message.as_deref().unwrap_or(body)
}

impl ClientError {
    /// Create a status error from a non-2xx response body
    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<KintoneApiError>(&body)
            .ok()
            .map(|e| e.message);

        Self::Status { status, body, message }
    }

    /// Create a JSON parsing error with endpoint context
    pub fn json_parse(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParse { endpoint: endpoint.into(), source }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a filesystem error for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// HTTP status of the failed request, if the server answered at all
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Check if this error indicates a network issue rather than an API answer
    pub fn is_network_error(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
