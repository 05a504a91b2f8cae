//! Authentication service.
//!
//! Password registration and login, account updates and the
//! forgot/reset password flow.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use sqlx::PgPool;

use delicious_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes in a reset token (hex-encoded to 40 characters).
const RESET_TOKEN_BYTES: usize = 20;

/// How long a reset token stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// A freshly issued password reset token.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub user: User,
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Authentication service.
///
/// Handles user registration, login, profile updates and password resets.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new user with email, name and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::MissingName` if the name is blank.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let name = validate_name(name)?;
        validate_new_password(password, password_confirm)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&email, name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::MissingName` for bad
    /// input, `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn update_account(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let name = validate_name(name)?;

        self.users
            .update_profile(user_id, &email, name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Issue a reset token for the account with this email.
    ///
    /// Returns `None` when no account matches; callers report success either
    /// way so the response does not reveal which emails are registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<ResetToken>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires = Utc::now() + TimeDelta::hours(RESET_TOKEN_TTL_HOURS);

        let user = self.users.set_reset_token(&email, &token, expires).await?;
        Ok(user.map(|user| ResetToken {
            user,
            token,
            expires,
        }))
    }

    /// The user a reset token belongs to, if the token is still valid.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or expired.
    pub async fn user_for_reset_token(&self, token: &str) -> Result<User, AuthError> {
        let (user, expires) = self
            .users
            .get_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        check_reset_expiry(expires, Utc::now())?;
        Ok(user)
    }

    /// Set a new password using a reset token. The token is consumed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or expired.
    /// Returns `AuthError::PasswordMismatch` / `AuthError::WeakPassword` for bad input.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        validate_new_password(password, password_confirm)?;
        let user = self.user_for_reset_token(token).await?;

        let password_hash = hash_password(password)?;
        self.users.set_password(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(user)
    }
}

/// A token is usable only while `now` is before its expiry.
fn check_reset_expiry(expires: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), AuthError> {
    match expires {
        Some(expires) if now < expires => Ok(()),
        _ => Err(AuthError::InvalidResetToken),
    }
}

/// 40 hex characters of OS-seeded randomness.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::MissingName);
    }
    Ok(name)
}

/// Validate a new password and its confirmation.
fn validate_new_password(password: &str, password_confirm: &str) -> Result<(), AuthError> {
    if password != password_confirm {
        return Err(AuthError::PasswordMismatch);
    }
    validate_password(password)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
