//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::database::is_unique_violation;
use common::error::{AccessDenied, PaginationError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// An access policy refused the request
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    /// Page outside the listing
    #[error(transparent)]
    InvalidPage(#[from] PaginationError),

    /// Resource not found
    #[error("Not found")]
    NotFound,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl ApiError {
    /// Map a repository failure, logging anything that is not the caller's
    /// fault
    pub fn from_repository(context: &str, err: anyhow::Error) -> Self {
        if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
            if is_unique_violation(sqlx_err) {
                return ApiError::BadRequest(format!("{context}: already exists"));
            }
            if sqlx_err
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                return ApiError::BadRequest(format!("{context}: unknown reference"));
            }
        }

        error!("{}: {}", context, err);
        ApiError::InternalServerError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(denied) => (StatusCode::FORBIDDEN, denied.to_string()),
            ApiError::InvalidPage(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
