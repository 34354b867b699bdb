//! Error handling for the Stepwright API
//!
//! Maps domain errors onto HTTP statuses. Every failure body has the
//! shape `{"error": "<message>"}`.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use stepwright_common::Error;
use tracing::error;

/// Result alias for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Error as surfaced to API clients.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),
    /// Not found (404)
    NotFound(String),
    /// Conflict (409)
    Conflict(String),
    /// Service unavailable (503)
    Unavailable(String),
    /// Internal server error (500); the cause is logged, not sent
    Internal,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::InvalidPayload(_) | Error::UnsupportedAction(_) => {
                ApiError::BadRequest(err.to_string())
            }
            Error::NotFound { .. } | Error::StepNotFound { .. } | Error::TestCaseNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            Error::AlreadyExists { .. } | Error::DuplicateOrderIndex { .. } => {
                ApiError::Conflict(err.to_string())
            }
            Error::StoreTimeout { .. } => ApiError::Unavailable(err.to_string()),
            Error::Io(_) | Error::Database(_) | Error::Serialization(_) => {
                error!("request failed on a store error: {}", err);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let cases = [
            (
                ApiError::from(Error::InvalidPayload("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(Error::TestCaseNotFound { id: 7 }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(Error::DuplicateOrderIndex { order_index: 2 }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(Error::StoreTimeout { ms: 5000 }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_store_errors_stay_opaque() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = ApiError::from(Error::Io(io));
        assert!(matches!(err, ApiError::Internal));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
