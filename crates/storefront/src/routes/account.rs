//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::{Flash, FlashKind, PageContext, redirect_with};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Account form data.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    pub name: String,
    pub email: String,
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub gravatar: String,
}

/// Display the account page.
///
/// The `RequireAuth` extractor ensures the user is logged in.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    flash: Flash,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .get_user(current_user.id)
        .await?;

    Ok(AccountTemplate {
        page: PageContext::new("Edit Your Account", Some(current_user), flash),
        gravatar: user.gravatar(),
        name: user.name,
        email: user.email.into_inner(),
    })
}

/// Update the user's name and email.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    session: Session,
    Form(form): Form<AccountForm>,
) -> Result<Response> {
    let result = AuthService::new(state.pool())
        .update_account(current_user.id, &form.name, &form.email)
        .await;

    match result {
        Ok(user) => {
            // Keep the navigation bar in sync with the new name and email.
            set_current_user(&session, &CurrentUser::from(&user))
                .await
                .map_err(|e| AppError::Internal(format!("Failed to set session: {e}")))?;
            Ok(
                redirect_with(&session, "/account", FlashKind::Success, "Updated the profile!")
                    .await
                    .into_response(),
            )
        }
        Err(
            e @ (AuthError::InvalidEmail(_) | AuthError::MissingName | AuthError::UserAlreadyExists),
        ) => Ok(
            redirect_with(&session, "/account", FlashKind::Error, &e.user_message())
                .await
                .into_response(),
        ),
        Err(e) => Err(e.into()),
    }
}
