use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use redis::RedisError;
use serde_json::json;
use tracing::error;

use crate::validation::{ValidationError, NON_FIELD_ERRORS};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("redis error: {0}")]
    RedisError(#[from] RedisError),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("store error: {0}")]
    StoreError(String),
    #[error("{kind} with id {id} not found")]
    NotFound { kind: &'static str, id: u64 },
    #[error("not found: {0}")]
    UnresolvedPath(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("server error: {0}")]
    Server(String),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: u64) -> Self {
        AppError::NotFound { kind, id }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::new(
            NON_FIELD_ERRORS,
            rejection.body_text(),
        ))
    }
}

/// An id segment that does not parse can never name a stored record.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::UnresolvedPath(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        let (status, body) = match self {
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_body()),
            AppError::NotFound { .. } | AppError::UnresolvedPath(_) => {
                (StatusCode::NOT_FOUND, json!({ "detail": detail }))
            }
            AppError::RedisError(_)
            | AppError::JsonError(_)
            | AppError::StoreError(_)
            | AppError::Config(_)
            | AppError::Server(_) => {
                error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": detail }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
