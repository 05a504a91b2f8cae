//! Review route handlers.

use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, header::REFERER},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use delicious_core::StoreId;

use super::{FlashKind, redirect_with};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{ReviewService, StoreError};
use crate::state::AppState;

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub text: String,
    /// Missing when no star was picked.
    pub rating: Option<i64>,
}

/// Add a review to a store, then go back to the page the form was on.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let back = back_path(&headers);
    let result = ReviewService::new(state.pool())
        .add(user.id, StoreId::new(id), &form.text, form.rating.unwrap_or(0))
        .await;

    match result {
        Ok(_) => Ok(redirect_with(&session, &back, FlashKind::Success, "Review Saved!")
            .await
            .into_response()),
        Err(StoreError::Validation(e)) => Ok(redirect_with(
            &session,
            &back,
            FlashKind::Error,
            &e.to_string(),
        )
        .await
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Local path of the referring page, or `/stores`.
///
/// Only the path is kept so the redirect never leaves this site.
fn back_path(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| url::Url::parse(referer).ok())
        .map(|url| url.path().to_string())
        .filter(|path| path.starts_with("/store/"))
        .unwrap_or_else(|| "/stores".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(referer: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_str(referer).unwrap());
        headers
    }

    #[test]
    fn test_back_to_store_page() {
        assert_eq!(
            back_path(&headers("http://localhost:7777/store/sars-cafe?success=x")),
            "/store/sars-cafe"
        );
    }

    #[test]
    fn test_back_ignores_foreign_paths() {
        assert_eq!(back_path(&headers("https://evil.example/login")), "/stores");
        assert_eq!(back_path(&headers("not a url")), "/stores");
        assert_eq!(back_path(&HeaderMap::new()), "/stores");
    }
}
