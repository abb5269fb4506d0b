//! Error types shared by every layer of the Homey client.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// A specialized `Result` type for Homey operations.
pub type HomeyResult<T> = std::result::Result<T, HomeyError>;

/// Represents errors that can occur while talking to a Homey hub.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum HomeyError {
    /// The hub could not be reached (refused, DNS, TLS, transport failure).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Credentials were rejected, or the probe answered with an unexpected status.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Human readable reason
        message: String,
        /// HTTP status returned by the hub, if any
        status: Option<u16>,
    },

    /// Authenticated but not allowed to perform the request.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad caller input, detected before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-2xx response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Short description of the failed request
        message: String,
        /// Best-effort parsed error body (empty object when unparseable)
        details: Value,
    },

    /// The request did not complete within its timeout.
    #[error("Request timed out after {timeout:?} for operation: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// The timeout that was exceeded
        timeout: Duration,
    },

    /// Real-time channel failure (discovery exhausted, handshake rejected).
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The real-time channel is already open, connecting or reconnecting.
    #[error("Event channel is already connecting or connected")]
    AlreadyConnected,

    /// A successful response carried a body that is not valid JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HomeyError {
    /// Create an authentication error without a status code
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            status: None,
        }
    }

    /// Create an API error with empty details
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// HTTP status associated with this error, when one is known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } => *status,
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// True for failures caused by the credentials rather than the request.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Permission(_))
    }
}

impl From<serde_json::Error> for HomeyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for HomeyError {
    fn from(err: url::ParseError) -> Self {
        Self::Validation(format!("invalid URL: {}", err))
    }
}
