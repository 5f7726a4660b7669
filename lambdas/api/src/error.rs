use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use cqrs_es::{persist::PersistenceError, AggregateError};
use serde_json::json;
use thiserror::Error;

/// HTTP-facing error: validation-class failures map to 4xx, anything that
/// went wrong against the store maps to 500.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!("Internal error: {}", detail);
        }
        (self.status(), Json(json!({ "msg": self.to_string() }))).into_response()
    }
}

impl From<domain::Error> for ApiError {
    fn from(err: domain::Error) -> Self {
        match err {
            domain::Error::NotFound { .. } => ApiError::NotFound(err.to_string()),
            domain::Error::Forbidden => ApiError::Forbidden(err.to_string()),
            domain::Error::Uniqueness { .. }
            | domain::Error::InvalidStateTransition { .. }
            | domain::Error::Validation { .. } => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<AggregateError<domain::Error>> for ApiError {
    fn from(err: AggregateError<domain::Error>) -> Self {
        match err {
            AggregateError::UserError(e) => e.into(),
            AggregateError::AggregateConflict => {
                ApiError::Conflict("Concurrent update, please retry".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
