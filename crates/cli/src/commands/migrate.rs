//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded into
//! the binary at compile time.

use super::{CommandError, connect};

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn storefront() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    pool.close().await;
    tracing::info!("Storefront migrations complete!");
    Ok(())
}
