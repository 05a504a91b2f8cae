//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod stats;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use delicious_storefront::db;
use delicious_storefront::services::{AuthError, StoreError};

/// Errors shared by every subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} seed validation errors found")]
    InvalidSeed(usize),

    #[error("Seed data refers to unknown user: {0}")]
    UnknownUser(String),

    #[error("Seed data refers to unknown store: {0}")]
    UnknownStore(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Load `.env` and connect to the storefront database.
///
/// # Errors
///
/// Returns `CommandError::MissingEnvVar` if no database URL is configured.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}
