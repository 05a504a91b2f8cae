//! Database operations for storefront `PostgreSQL`.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `user` - Accounts, password hashes and reset tokens
//! - `store` - Listings, with a generated full-text `search` column
//! - `review` - Star ratings and text, one author and one store each
//! - `heart` - User/store favorite membership
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p delicious-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`query_as` + `FromRow`), so building the
//! crate never needs a live database.

pub mod reviews;
pub mod stores;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use reviews::ReviewRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email or slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to their repository meaning.
///
/// `what` names the unique value for the conflict message.
fn map_constraint_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
