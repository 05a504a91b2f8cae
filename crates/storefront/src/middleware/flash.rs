//! One-shot flash messages kept in the session.
//!
//! A handler stores a message right before redirecting; the next page that
//! renders takes it out of the session again. Query strings are never read,
//! so a link cannot put its own text in the page banner.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Messages rendered at the top of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub error: Option<String>,
    pub success: Option<String>,
    pub info: Option<String>,
}

/// Kind of flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Error,
    Success,
    Info,
}

impl Flash {
    /// A flash carrying one message.
    #[must_use]
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        let message = Some(message.into());
        match kind {
            FlashKind::Error => Self {
                error: message,
                ..Self::default()
            },
            FlashKind::Success => Self {
                success: message,
                ..Self::default()
            },
            FlashKind::Info => Self {
                info: message,
                ..Self::default()
            },
        }
    }

    /// A flash carrying only an error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Error, message)
    }
}

/// Queue a message for the next rendered page.
///
/// A session failure loses the message but never the redirect, so it is
/// logged rather than returned.
pub async fn set_flash(session: &Session, kind: FlashKind, message: &str) {
    if let Err(e) = session
        .insert(session_keys::FLASH, Flash::new(kind, message))
        .await
    {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Remove and return the queued message, if any.
pub async fn take_flash(session: &Session) -> Flash {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match parts.extensions.get::<Session>() {
            Some(session) => take_flash(session).await,
            None => Self::default(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn extract(uri: &str, session: Option<Session>) -> Flash {
        let mut builder = Request::builder().uri(uri);
        if let Some(session) = session {
            builder = builder.extension(session);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        Flash::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let session = session();
        set_flash(&session, FlashKind::Success, "Review Saved!").await;

        let flash = extract("/store/sars-cafe", Some(session.clone())).await;
        assert_eq!(flash.success.as_deref(), Some("Review Saved!"));
        assert!(flash.error.is_none());

        assert_eq!(extract("/store/sars-cafe", Some(session)).await, Flash::default());
    }

    #[tokio::test]
    async fn test_query_string_text_is_not_shown() {
        let flash = extract(
            "/stores?error=Your+account+is+locked&success=x&info=y",
            Some(session()),
        )
        .await;
        assert_eq!(flash, Flash::default());
    }

    #[tokio::test]
    async fn test_missing_session_yields_empty_flash() {
        assert_eq!(extract("/stores?error=x", None).await, Flash::default());
    }

    #[tokio::test]
    async fn test_newer_message_replaces_older() {
        let session = session();
        set_flash(&session, FlashKind::Error, "Failed login!").await;
        set_flash(&session, FlashKind::Info, "Moved to page 2").await;

        let flash = take_flash(&session).await;
        assert_eq!(flash, Flash::new(FlashKind::Info, "Moved to page 2"));
    }
}
