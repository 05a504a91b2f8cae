//! Integration tests for Delicious.
//!
//! # Running Tests
//!
//! ```bash
//! # Pure rule tests run with the rest of the workspace
//! cargo test -p delicious-integration-tests
//!
//! # Live tests need a migrated database and a running storefront
//! cargo run -p delicious-cli -- migrate
//! cargo run -p delicious-storefront &
//! cargo test -p delicious-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `core_rules` - Slug, rating, tag, proximity and ownership rules
//! - `storefront_services` - Services against a real database
//! - `storefront_api` - HTTP flows against a running server
//!
//! The helpers below are shared by the test files.

use chrono::Utc;
use secrecy::SecretString;
use sqlx::PgPool;

use delicious_core::{GeoPoint, Location, Rating, Review, ReviewId, Store, StoreId, UserId};

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:7777".to_string())
}

/// Connect to the storefront database named by `STOREFRONT_DATABASE_URL`.
///
/// # Panics
///
/// Panics if the variable is unset or the database is unreachable.
pub async fn storefront_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFRONT_DATABASE_URL not set");
    delicious_storefront::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to storefront database")
}

/// An email address no other test run will use.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// An in-memory listing at a fixed point.
///
/// # Panics
///
/// Panics if the coordinates are out of range.
#[must_use]
pub fn store(id: i32, name: &str, lng: f64, lat: f64) -> Store {
    let point = GeoPoint::new(lng, lat).expect("valid coordinates");
    Store {
        id: StoreId::new(id),
        name: name.to_string(),
        slug: delicious_core::rules::slugify(name),
        description: String::new(),
        tags: Vec::new(),
        created_at: Utc::now(),
        location: Location::new(point, "1 Test St").expect("valid address"),
        photo: None,
        author: UserId::new(1),
    }
}

/// In-memory reviews of `store`, one per rating.
///
/// # Panics
///
/// Panics if a rating is outside 1-5.
#[must_use]
pub fn reviews_of(store: i32, ratings: &[i64]) -> Vec<Review> {
    ratings
        .iter()
        .zip(1..)
        .map(|(&rating, n)| Review {
            id: ReviewId::new(store * 100 + n),
            created_at: Utc::now(),
            author: UserId::new(n),
            store: StoreId::new(store),
            text: "review".to_string(),
            rating: Rating::new(rating).expect("rating in range"),
        })
        .collect()
}
