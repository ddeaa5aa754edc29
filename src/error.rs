// Error types for the Seafile client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by every client operation.
///
/// Nothing is retried internally: each variant reaches the caller as soon as
/// the failing round trip completes.
#[derive(Error, Debug)]
pub enum SeafileError {
    /// No token is set, or the server refused the credentials.
    #[error("authentication failed: {message}")]
    Auth {
        status: Option<StatusCode>,
        message: String,
    },

    /// The request never produced a response (DNS, connect, timeout, TLS...).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a status the operation does not accept.
    #[error("server returned {status}: {body}")]
    Protocol { status: StatusCode, body: String },

    /// The response body does not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A lookup by name found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller passed an argument the server would reject.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeafileError {
    pub(crate) fn missing_token() -> Self {
        SeafileError::Auth {
            status: None,
            message: "no auth token set, call login first".into(),
        }
    }

    /// HTTP status attached to the error, if the server produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SeafileError::Auth { status, .. } => *status,
            SeafileError::Protocol { status, .. } => Some(*status),
            SeafileError::Network(e) => e.status(),
            _ => None,
        }
    }
}

/// Result type for Seafile client operations.
pub type Result<T> = std::result::Result<T, SeafileError>;
