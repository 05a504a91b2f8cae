//! Who is logged in.
//!
//! The logged-in user lives in the session under `current_user`. Handlers
//! that need one take `RequireAuth`; pages that only adapt to one (hearts,
//! edit links) take `OptionalAuth`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash::{FlashKind, set_flash};
use crate::models::{CurrentUser, session_keys};

/// Message shown on the login page after a bounce.
const LOGIN_REQUIRED: &str = "You must be logged in to do that!";

/// A logged-in user, or the request is turned away.
///
/// Pages bounce to `/auth/login` with an error flash. `/api/*` calls get a
/// bare 401 so the heart button script can redirect by itself.
pub struct RequireAuth(pub CurrentUser);

/// Why `RequireAuth` turned a request away.
pub enum AuthRejection {
    RedirectToLogin,
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        match user {
            Some(user) => Ok(Self(user)),
            None if parts.uri.path().starts_with("/api/") => Err(AuthRejection::Unauthorized),
            None => {
                set_flash(session, FlashKind::Error, LOGIN_REQUIRED).await;
                Err(AuthRejection::RedirectToLogin)
            }
        }
    }
}

/// The logged-in user, if any. Never rejects.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log out by dropping the whole session, id included.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
