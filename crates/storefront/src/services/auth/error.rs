//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] delicious_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Display name was blank.
    #[error("you must supply a name")]
    MissingName,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Reset token is unknown or expired. Both cases look the same.
    #[error("password reset token is invalid or has expired")]
    InvalidResetToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message safe to show to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "That email address is not valid.".to_string(),
            Self::InvalidCredentials | Self::UserNotFound => {
                "Invalid email or password.".to_string()
            }
            Self::UserAlreadyExists => "An account with this email already exists.".to_string(),
            Self::MissingName => "You must supply a name!".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::PasswordMismatch => "Oops! Your passwords do not match.".to_string(),
            Self::InvalidResetToken => {
                "Password reset is invalid or has expired.".to_string()
            }
            Self::Repository(_) | Self::PasswordHash => "Something went wrong.".to_string(),
        }
    }
}
