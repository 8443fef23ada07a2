//! Client error types

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures seen by the polling client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, timed out, reset, ...
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered 404
    #[error("not found: {0}")]
    NotFound(String),

    /// Server answered 400
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Server answered 409
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success status
    #[error("unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Error body or raw text
        message: String,
    },

    /// Success status with a body that is not the expected JSON
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the next poll tick may succeed where this one failed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map an error status and its body to a client error
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.to_string());

        match status {
            400 => Self::BadRequest(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::UnexpectedStatus { status, message },
        }
    }
}
