//! Error types for the offline worker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Worker Error Enum ==
/// Unified error type for the offline worker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The network fetch was rejected (connection refused, DNS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// The network fetch did not finish before the configured deadline
    #[error("Fetch timed out after {0}ms")]
    Timeout(u64),

    /// A push payload or client message could not be parsed
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A URL could not be parsed or resolved against the origin
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No client or notification with the given id
    #[error("Not found: {0}")]
    NotFound(String),

    /// The lifecycle is not in a state that allows the operation
    #[error("State error: {0}")]
    State(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// True for failures that strategies recover from with a cache fallback.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, WorkerError::Network(_) | WorkerError::Timeout(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkerError::Network(_) | WorkerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            WorkerError::MalformedPayload(_) | WorkerError::InvalidUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkerError::State(_) => StatusCode::CONFLICT,
            WorkerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the offline worker.
pub type Result<T> = std::result::Result<T, WorkerError>;
