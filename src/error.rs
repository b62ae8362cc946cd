use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Crate-wide error type.
///
/// Every moderation failure has its own variant so callers can tell
/// "already did this" apart from "doesn't exist" and "not allowed".
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("parent comment {0} not found")]
    ParentNotFound(String),
    #[error("user has already liked this {0}")]
    AlreadyLiked(String),
    #[error("user has not liked this {0}")]
    NotLiked(String),
    #[error("user has already reported this {0}")]
    DuplicateReport(String),
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Raised by cache backends only; the response cache swallows it.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::ParentNotFound(_) => "parent_not_found",
            AppError::AlreadyLiked(_) => "already_liked",
            AppError::NotLiked(_) => "not_liked",
            AppError::DuplicateReport(_) => "duplicate_report",
            AppError::DuplicateId(_) => "duplicate_id",
            AppError::Validation(_) => "validation_failed",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::CacheUnavailable(_) => "cache_unavailable",
            AppError::Database(_) => "database",
            AppError::Serialization(_) => "serialization",
            AppError::Configuration(_) => "configuration",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::ParentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyLiked(_)
            | AppError::NotLiked(_)
            | AppError::DuplicateReport(_)
            | AppError::DuplicateId(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_)
            | AppError::Serialization(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.kind(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
