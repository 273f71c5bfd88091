//! Error types for the cache subsystem
//!
//! Provides unified error handling using thiserror. Only the admin API ever
//! turns these into responses; the cache tiers log and absorb them.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache subsystem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A remote operation failed mid-call
    #[error("Remote error: {0}")]
    Remote(String),

    /// A remote operation did not answer in time
    #[error("Remote operation timed out after {0:?}")]
    Timeout(Duration),

    /// A value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Remote(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Remote(_) => StatusCode::BAD_GATEWAY,
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response = CacheError::InvalidRequest("empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_serialization_error_from_serde() {
        let err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: CacheError = err.into();
        assert!(matches!(err, CacheError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        let err = CacheError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
