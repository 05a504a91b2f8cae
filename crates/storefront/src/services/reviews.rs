//! Review service.

use sqlx::PgPool;

use delicious_core::{NewReview, Review, StoreId, UserId};

use super::stores::StoreError;
use crate::db::reviews::ReviewWithAuthor;
use crate::db::{RepositoryError, ReviewRepository};

/// Review service.
pub struct ReviewService<'a> {
    reviews: ReviewRepository<'a>,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            reviews: ReviewRepository::new(pool),
        }
    }

    /// Validate and store a review of `store` by `author`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for blank text or a rating outside 1-5,
    /// `StoreError::NotFound` if the store doesn't exist.
    pub async fn add(
        &self,
        author: UserId,
        store: StoreId,
        text: &str,
        rating: i64,
    ) -> Result<Review, StoreError> {
        let review = NewReview::new(text, rating)?;

        let review = self
            .reviews
            .create(author, store, &review)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => StoreError::NotFound,
                other => other.into(),
            })?;

        tracing::info!(review_id = %review.id, store_id = %store, "Review added");
        Ok(review)
    }

    /// Reviews of a store with their authors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn for_store(&self, store: StoreId) -> Result<Vec<ReviewWithAuthor>, StoreError> {
        Ok(self.reviews.for_store(store).await?)
    }
}
