//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::registry::RegistryError;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Body for a missing experiment
pub const EXPERIMENT_NOT_FOUND: &str = "Experiment not found";

/// Body for an unroutable request
pub const ROUTE_NOT_FOUND: &str = "Not found";

/// Body for an unparseable create request
pub const INVALID_JSON: &str = "Invalid JSON";

/// Body for a rejected duplicate create
pub const ALREADY_EXISTS: &str = "Experiment already exists";

/// API error with HTTP status code
///
/// Renders as `{"error": message}` and nothing else; clients match on the
/// message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("[{status:?}] {message}")]
pub struct ApiError {
    /// HTTP status code
    #[serde(skip)]
    pub status: StatusCode,

    /// Error message
    #[serde(rename = "error")]
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 for a create body that is not a JSON object
    pub fn invalid_json() -> Self {
        Self::new(StatusCode::BAD_REQUEST, INVALID_JSON)
    }

    /// 404 for an unknown `(namespace, name)`
    pub fn experiment_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, EXPERIMENT_NOT_FOUND)
    }

    /// 404 for anything the router does not handle
    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND)
    }

    /// 409 for a duplicate key under the reject policy
    pub fn conflict() -> Self {
        Self::new(StatusCode::CONFLICT, ALREADY_EXISTS)
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => Self::experiment_not_found(),
            RegistryError::AlreadyExists(_) => Self::conflict(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
