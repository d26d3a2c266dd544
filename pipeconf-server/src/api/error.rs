//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::config::ConfigError;
use crate::service::test_task::TestError;
use crate::store::StoreError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    StoreError(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(msg) => ApiError::BadRequest(msg),
            e @ (ConfigError::NotFound(_) | ConfigError::VersionNotFound { .. }) => {
                ApiError::NotFound(e.to_string())
            }
            e @ ConfigError::AlreadyExists(_) => ApiError::Conflict(e.to_string()),
            ConfigError::Store(err) => ApiError::StoreError(err),
        }
    }
}

impl From<TestError> for ApiError {
    fn from(err: TestError) -> Self {
        match err {
            TestError::Validation(msg) => ApiError::BadRequest(msg),
            e @ TestError::NotFound(_) => ApiError::NotFound(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_map_to_status() {
        let cases = [
            (ConfigError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ConfigError::NotFound("c1".into()), StatusCode::NOT_FOUND),
            (
                ConfigError::VersionNotFound {
                    id: "c1".into(),
                    version: 9,
                },
                StatusCode::NOT_FOUND,
            ),
            (ConfigError::AlreadyExists("c1".into()), StatusCode::CONFLICT),
            (
                ConfigError::Store(StoreError::Backend("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_test_errors_map_to_status() {
        let err = ApiError::from(TestError::NotFound(uuid::Uuid::nil()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(TestError::Validation("too many".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
