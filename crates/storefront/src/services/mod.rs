//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, account updates, password reset
//! - `stores` - Listing writes (slugs, ownership), pages, tags, top, proximity, search, hearts
//! - `reviews` - Adding and listing reviews
//! - `photos` - Uploaded photo storage

pub mod auth;
pub mod photos;
pub mod reviews;
pub mod stores;

pub use auth::{AuthError, AuthService};
pub use photos::{PhotoError, PhotoStore};
pub use reviews::ReviewService;
pub use stores::{StoreError, StoreService};
