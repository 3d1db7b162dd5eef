use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::hierarchy::HierarchyError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden resource")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// 401 with the generic message
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Unauthorized access".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match &self {
            AppError::Forbidden => ("Forbidden resource".to_string(), None),
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg) => (msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
            AppError::Validation(msg) => ("Validation failed".to_string(), Some(msg.clone())),
        };

        let body = ErrorResponse {
            success: false,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<HierarchyError> for AppError {
    fn from(err: HierarchyError) -> Self {
        let message = err.to_string();
        match err {
            HierarchyError::NotFound(_) => AppError::NotFound(message),
            HierarchyError::SelfManagement
            | HierarchyError::CircularHierarchy
            | HierarchyError::HasSubordinates => AppError::BadRequest(message),
            HierarchyError::StorageConflict(_) => AppError::Conflict(message),
            HierarchyError::StorageFailure => AppError::Internal(message),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::UsernameTaken => AppError::Conflict(message),
            AuthError::InvalidCredentials | AuthError::InvalidRefreshToken => {
                AppError::Unauthorized(message)
            }
            AuthError::Token(_) => AppError::unauthorized(),
            AuthError::UserNotFound => AppError::NotFound(message),
            AuthError::Hash(_) | AuthError::Storage(_) => AppError::Internal(message),
        }
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;
