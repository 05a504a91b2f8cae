//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use delicious_core::ValidationError;

use crate::db::RepositoryError;
use crate::services::{AuthError, PhotoError, StoreError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Photo upload failed.
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),

    /// Input failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Actor may not perform this action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Store(err) => matches!(err, StoreError::Repository(_)),
            Self::Photo(err) => matches!(err, PhotoError::Io(_)),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::MissingName
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch => StatusCode::BAD_REQUEST,
                AuthError::InvalidResetToken => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Store(err) => match err {
                StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::Ownership(_) => StatusCode::FORBIDDEN,
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::SlugConflict(_) => StatusCode::CONFLICT,
                StoreError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Photo(err) => match err {
                PhotoError::NotAnImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                PhotoError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message shown to the client. Never includes internal details.
    fn public_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Auth(err) => err.user_message(),
            Self::Store(StoreError::Validation(err)) | Self::Validation(err) => err.to_string(),
            Self::Store(StoreError::Ownership(_)) => {
                "You must own a store in order to edit it!".to_string()
            }
            Self::Store(StoreError::NotFound) | Self::Database(RepositoryError::NotFound) => {
                "Store not found".to_string()
            }
            Self::Store(StoreError::SlugConflict(_)) => {
                "Another store was saved with this name at the same time. Please try again."
                    .to_string()
            }
            Self::Photo(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
