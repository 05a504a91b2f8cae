//! Listing statistics: the top-rated stores and how often each tag is used.

use tracing::info;

use delicious_storefront::services::StoreService;

use super::{CommandError, connect};

/// Print the top stores and tag counts.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn print() -> Result<(), CommandError> {
    let pool = connect().await?;
    let stores = StoreService::new(&pool);

    let top = stores.top().await?;
    let tags = stores.tag_list().await?;
    pool.close().await;

    info!("Top Stores");
    info!("==========");
    if top.is_empty() {
        info!("No store has enough reviews to be ranked yet.");
    }
    for (rank, store) in top.iter().enumerate() {
        info!(
            "{:>2}. {} ({}) - {:.1} stars from {} reviews",
            rank + 1,
            store.name,
            store.slug,
            store.average_rating,
            store.review_count()
        );
    }

    info!("Tags");
    info!("====");
    for tag in &tags {
        info!("  {}: {}", tag.tag, tag.count);
    }

    Ok(())
}
