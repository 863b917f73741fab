use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use matching_engine::EngineError;
use order_store::StoreError;
use serde_json::json;
use thiserror::Error;
use types::InvalidRequest;

/// Central error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<InvalidRequest> for AppError {
    fn from(err: InvalidRequest) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::OrderNotFound { .. } => AppError::NotFound(err.to_string()),
            EngineError::Storage(_) | EngineError::Unavailable => {
                AppError::ServiceUnavailable(err.to_string())
            }
            EngineError::Inconsistency { .. } => AppError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound(err.to_string()),
            _ => AppError::ServiceUnavailable(err.to_string()),
        }
    }
}
