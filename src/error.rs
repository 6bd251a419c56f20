//! Error types for the response cache
//!
//! Store and codec failures never reach the request path; they are absorbed
//! by the connection manager and the middleware. `ApiError` is the only error
//! that is rendered to HTTP clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Store Error ==
/// Failure reported by a key-value store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Could not establish a connection to the store
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The store did not answer within the configured timeout
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// The store answered with an error or an unexpected reply
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The requested expiry cannot be stored
    #[error("Invalid expire time: {0}s")]
    InvalidTtl(u64),

    /// The store is switched off or has no live handle
    #[error("Store unavailable")]
    Unavailable,
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(0)
        } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Protocol(err.to_string())
        }
    }
}

// == Codec Error ==
/// Failure while compressing or decompressing a cache payload.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Compression failed: {0}")]
    Compress(#[source] std::io::Error),

    /// Tagged payload could not be inflated
    #[error("Corrupt entry: {0}")]
    Corrupt(#[source] std::io::Error),
}

// == API Error ==
/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("{0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Result of a raw store call.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_400() {
        let response = ApiError::InvalidRequest("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::Timeout(250).to_string(),
            "Operation timed out after 250ms"
        );
        assert_eq!(StoreError::Unavailable.to_string(), "Store unavailable");
    }
}
