//! Authentication route handlers.
//!
//! Handles login, registration, logout and password reset with locally
//! stored Argon2 credentials.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::{Flash, FlashKind, PageContext, redirect_with};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template. Also hosts the forgot-password form.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset.html")]
pub struct ResetPasswordTemplate {
    pub page: PageContext,
    pub token: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> impl IntoResponse {
    LoginTemplate {
        page: PageContext::new("Login", user, flash),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            log_in(&session, &user).await?;
            Ok(
                redirect_with(&session, "/", FlashKind::Success, "You are now logged in!")
                    .await
                    .into_response(),
            )
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Failed login attempt");
            Ok(
                redirect_with(&session, "/auth/login", FlashKind::Error, "Failed login!")
                    .await
                    .into_response(),
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to clear session: {e}")))?;
    clear_sentry_user();

    Ok(redirect_with(&session, "/", FlashKind::Success, "You are now logged out!").await)
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> impl IntoResponse {
    RegisterTemplate {
        page: PageContext::new("Register", user, flash),
        name: String::new(),
        email: String::new(),
    }
}

/// Handle registration form submission. A new account is logged in at once.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let result = AuthService::new(state.pool())
        .register(&form.email, &form.name, &form.password, &form.password_confirm)
        .await;

    match result {
        Ok(user) => {
            log_in(&session, &user).await?;
            Ok(
                redirect_with(&session, "/", FlashKind::Success, "You are now logged in!")
                    .await
                    .into_response(),
            )
        }
        Err(
            e @ (AuthError::InvalidEmail(_)
            | AuthError::MissingName
            | AuthError::WeakPassword(_)
            | AuthError::PasswordMismatch
            | AuthError::UserAlreadyExists),
        ) => {
            let template = RegisterTemplate {
                page: PageContext::new("Register", None, Flash::error(e.user_message())),
                name: form.name,
                email: form.email,
            };
            Ok((StatusCode::BAD_REQUEST, template).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Issue a reset token.
///
/// The response is the same whether or not the email is registered. No mail
/// is sent; the reset link is written to the log.
pub async fn forgot(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Redirect> {
    if let Some(reset) = AuthService::new(state.pool())
        .forgot_password(&form.email)
        .await?
    {
        let reset_url = state
            .config()
            .url_for(&format!("/auth/reset/{}", reset.token));
        tracing::info!(
            user_id = %reset.user.id,
            expires = %reset.expires,
            reset_url = %reset_url,
            "Password reset requested"
        );
    }

    Ok(redirect_with(
        &session,
        "/auth/login",
        FlashKind::Success,
        "You have been emailed a password reset link.",
    )
    .await)
}

/// Display the reset form if the token is valid.
pub async fn reset_page(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    flash: Flash,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .user_for_reset_token(&token)
        .await
    {
        Ok(_) => Ok(ResetPasswordTemplate {
            page: PageContext::new("Reset your Password", None, flash),
            token,
        }
        .into_response()),
        Err(AuthError::InvalidResetToken) => Ok(invalid_reset(&session).await),
        Err(e) => Err(e.into()),
    }
}

/// Set a new password, consume the token and log the user in.
pub async fn reset(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    let result = AuthService::new(state.pool())
        .reset_password(&token, &form.password, &form.password_confirm)
        .await;

    match result {
        Ok(user) => {
            log_in(&session, &user).await?;
            Ok(redirect_with(
                &session,
                "/",
                FlashKind::Success,
                "Nice! Your password has been reset! You are now logged in!",
            )
            .await
            .into_response())
        }
        Err(AuthError::InvalidResetToken) => Ok(invalid_reset(&session).await),
        Err(e @ (AuthError::PasswordMismatch | AuthError::WeakPassword(_))) => {
            let back = format!("/auth/reset/{}", urlencoding::encode(&token));
            Ok(
                redirect_with(&session, &back, FlashKind::Error, &e.user_message())
                    .await
                    .into_response(),
            )
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn invalid_reset(session: &Session) -> Response {
    redirect_with(
        session,
        "/auth/login",
        FlashKind::Error,
        &AuthError::InvalidResetToken.user_message(),
    )
    .await
    .into_response()
}

async fn log_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to set session: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(())
}
