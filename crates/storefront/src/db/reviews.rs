//! Review repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::{Email, NewReview, Rating, Review, ReviewId, StoreId, UserId};

use super::{RepositoryError, map_constraint_error};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` review queries.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    author_id: i32,
    store_id: i32,
    text: String,
    rating: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(row.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating for review {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ReviewId::new(row.id),
            created_at: row.created_at,
            author: UserId::new(row.author_id),
            store: StoreId::new(row.store_id),
            text: row.text,
            rating,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewWithAuthorRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    author_name: String,
    author_email: String,
}

/// A review joined with its author's public details.
#[derive(Debug, Clone)]
pub struct ReviewWithAuthor {
    pub review: Review,
    pub author_name: String,
    pub author_email: Email,
}

impl TryFrom<ReviewWithAuthorRow> for ReviewWithAuthor {
    type Error = RepositoryError;

    fn try_from(row: ReviewWithAuthorRow) -> Result<Self, Self::Error> {
        let author_email = Email::parse(&row.author_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            review: row.review.try_into()?,
            author_name: row.author_name,
            author_email,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or author doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        author: UserId,
        store: StoreId,
        review: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO storefront.review (author_id, store_id, text, rating)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, store_id, text, rating, created_at
            ",
        )
        .bind(author)
        .bind(store)
        .bind(&review.text)
        .bind(review.rating.get())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "review"))?;

        row.try_into()
    }

    /// Reviews of one store with author details, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_store(&self, store: StoreId) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewWithAuthorRow>(
            r"
            SELECT r.id, r.author_id, r.store_id, r.text, r.rating, r.created_at,
                   u.name AS author_name, u.email AS author_email
            FROM storefront.review r
            JOIN storefront.user u ON u.id = r.author_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(store)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Reviews of any of `stores`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_stores(&self, stores: &[StoreId]) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, author_id, store_id, text, rating, created_at
            FROM storefront.review
            WHERE store_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(stores)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Total number of reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.review")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
