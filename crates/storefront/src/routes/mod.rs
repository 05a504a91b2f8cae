//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Stores
//! GET  /                          - Store listing, page 1
//! GET  /stores                    - Store listing, page 1
//! GET  /stores/page/{page}        - Store listing, page N
//! GET  /stores/{id}/edit          - Edit form (author only)
//! GET  /store/{slug}              - Store detail with reviews
//! GET  /add                       - New store form (auth)
//! POST /add                       - Create store (auth, multipart)
//! POST /add/{id}                  - Update store (author only, multipart)
//! GET  /top                       - Top stores by rating
//! GET  /hearts                    - Hearted stores (auth)
//! GET  /map                       - Map page
//!
//! # Reviews and tags
//! POST /reviews/{id}              - Add review (auth)
//! GET  /tags                      - Tag list and tagged stores
//! GET  /tags/{tag}                - Stores with one tag
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! GET  /auth/register             - Register page
//! POST /auth/register             - Register action (logs the user in)
//! POST /auth/logout               - Logout action
//! POST /auth/forgot               - Issue a password reset token
//! GET  /auth/reset/{token}        - Reset form
//! POST /auth/reset/{token}        - Set a new password
//!
//! # Account (requires auth)
//! GET  /account                   - Account page
//! POST /account                   - Update name and email
//!
//! # JSON API
//! GET  /api/search?q=             - Full-text search
//! GET  /api/stores/near?lng=&lat= - Stores near a point
//! POST /api/stores/{id}/heart     - Toggle heart (401 when anonymous)
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod reviews;
pub mod stores;
pub mod tags;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use delicious_core::{Store, StoreId};

pub use crate::middleware::{Flash, FlashKind};
use crate::middleware::{api_rate_limiter, auth_rate_limiter, set_flash};
use crate::models::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Flash Messages
// =============================================================================

/// Redirect to `path`, showing `message` on the page it lands on.
pub async fn redirect_with(
    session: &Session,
    path: &str,
    kind: FlashKind,
    message: &str,
) -> Redirect {
    set_flash(session, kind, message).await;
    Redirect::to(path)
}

// =============================================================================
// Shared Views
// =============================================================================

/// Fields every page template needs for the layout.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub title: String,
    pub current_user: Option<CurrentUser>,
    pub flash: Flash,
}

impl PageContext {
    #[must_use]
    pub fn new(title: impl Into<String>, current_user: Option<CurrentUser>, flash: Flash) -> Self {
        Self {
            title: title.into(),
            current_user,
            flash,
        }
    }
}

/// Placeholder shown for stores without a photo.
pub const DEFAULT_PHOTO: &str = "/static/images/store.png";

/// Words of description shown on a store card.
const EXCERPT_WORDS: usize = 25;

/// A store as rendered in a listing grid.
#[derive(Debug, Clone)]
pub struct StoreCard {
    pub store: Store,
    pub hearted: bool,
    pub editable: bool,
}

impl StoreCard {
    /// Build cards for `stores`, marking the viewer's hearts and own listings.
    #[must_use]
    pub fn many(
        stores: Vec<Store>,
        hearts: &[StoreId],
        viewer: Option<delicious_core::UserId>,
    ) -> Vec<Self> {
        stores
            .into_iter()
            .map(|store| Self {
                hearted: hearts.contains(&store.id),
                editable: viewer.is_some_and(|user| store.is_authored_by(user)),
                store,
            })
            .collect()
    }

    #[must_use]
    pub fn photo_url(&self) -> String {
        photo_url(self.store.photo.as_deref())
    }

    /// First words of the description.
    #[must_use]
    pub fn excerpt(&self) -> String {
        excerpt(&self.store.description, EXCERPT_WORDS)
    }
}

/// Public URL of an uploaded photo, or the placeholder.
#[must_use]
pub fn photo_url(photo: Option<&str>) -> String {
    photo.map_or_else(|| DEFAULT_PHOTO.to_string(), |p| format!("/uploads/{p}"))
}

fn excerpt(text: &str, words: usize) -> String {
    let mut parts = text.split_whitespace();
    let head: Vec<&str> = parts.by_ref().take(words).collect();
    let mut out = head.join(" ");
    if parts.next().is_some() {
        out.push('…');
    }
    out
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
///
/// Only form submissions are rate limited; the pages themselves are not.
pub fn auth_routes() -> Router<AppState> {
    let pages = Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/reset/{token}", get(auth::reset_page));

    let actions = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/forgot", post(auth::forgot))
        .route("/reset/{token}", post(auth::reset))
        .layer(auth_rate_limiter());

    pages
        .merge(actions)
        .route("/logout", post(auth::logout))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(api::search))
        .route("/stores/near", get(api::near))
        .route("/stores/{id}/heart", post(api::heart))
        .layer(api_rate_limiter())
}

/// Create the store routes.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/stores/page/{page}", get(stores::page))
        .route("/stores/{id}/edit", get(stores::edit_form))
        .route("/store/{slug}", get(stores::show))
        .route("/add", get(stores::add_form).post(stores::create))
        .route("/add/{id}", post(stores::update))
        .route("/top", get(stores::top))
        .route("/hearts", get(stores::hearts))
        .route("/map", get(stores::map))
        .layer(DefaultBodyLimit::max(stores::MAX_UPLOAD_BYTES))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .route("/reviews/{id}", post(reviews::add))
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/account", get(account::index).post(account::update))
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
}
