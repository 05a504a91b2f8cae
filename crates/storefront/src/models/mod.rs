//! Domain models for the storefront.
//!
//! Listings and reviews live in `delicious_core`; these are the types that
//! only the web layer needs.

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
