//! Store (listing) repository for database operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use delicious_core::{GeoPoint, Location, Store, StoreDraft, StoreId, UserId};

use super::{RepositoryError, map_constraint_error};

/// Column list shared by every query returning a full store row.
macro_rules! store_columns {
    () => {
        "id, name, slug, description, tags, lng, lat, address, photo, author_id, created_at"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` store queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    tags: Vec<String>,
    lng: f64,
    lat: f64,
    address: String,
    photo: Option<String>,
    author_id: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let location = GeoPoint::new(row.lng, row.lat)
            .and_then(|point| Location::new(point, &row.address))
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid location for store {}: {e}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            tags: row.tags,
            created_at: row.created_at,
            location,
            photo: row.photo,
            author: UserId::new(row.author_id),
        })
    }
}

/// Store row with its full-text rank.
#[derive(Debug, sqlx::FromRow)]
struct SearchRow {
    id: i32,
    slug: String,
    name: String,
    description: String,
    photo: Option<String>,
    score: f32,
}

/// A text search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: StoreId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
    pub score: f32,
}

impl From<SearchRow> for SearchHit {
    fn from(row: SearchRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            slug: row.slug,
            name: row.name,
            description: row.description,
            photo: row.photo,
            score: row.score,
        }
    }
}

fn into_stores(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(TryInto::try_into).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::NotFound` if the author doesn't exist.
    pub async fn create(
        &self,
        draft: &StoreDraft,
        slug: &str,
        author: UserId,
    ) -> Result<Store, RepositoryError> {
        let point = draft.location.point();
        let row = sqlx::query_as::<_, StoreRow>(concat!(
            r"
            INSERT INTO storefront.store
                (name, slug, description, tags, lng, lat, address, photo, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING ",
            store_columns!()
        ))
        .bind(&draft.name)
        .bind(slug)
        .bind(&draft.description)
        .bind(&draft.tags)
        .bind(point.lng)
        .bind(point.lat)
        .bind(&draft.location.address)
        .bind(&draft.photo)
        .bind(author)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "slug"))?;

        row.try_into()
    }

    /// Overwrite a listing's fields. A `None` photo keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: StoreId,
        draft: &StoreDraft,
        slug: &str,
    ) -> Result<Store, RepositoryError> {
        let point = draft.location.point();
        let row = sqlx::query_as::<_, StoreRow>(concat!(
            r"
            UPDATE storefront.store
            SET name = $2,
                slug = $3,
                description = $4,
                tags = $5,
                lng = $6,
                lat = $7,
                address = $8,
                photo = COALESCE($9, photo)
            WHERE id = $1
            RETURNING ",
            store_columns!()
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(slug)
        .bind(&draft.description)
        .bind(&draft.tags)
        .bind(point.lng)
        .bind(point.lat)
        .bind(&draft.location.address)
        .bind(&draft.photo)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "slug"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Get a listing by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM storefront.store WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a listing by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM storefront.store WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Slugs matching `pattern` (case-insensitive POSIX regex), excluding
    /// the listing `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slugs_matching(
        &self,
        pattern: &str,
        exclude: Option<StoreId>,
    ) -> Result<Vec<String>, RepositoryError> {
        let slugs = sqlx::query_scalar::<_, String>(
            r"
            SELECT slug
            FROM storefront.store
            WHERE slug ~* $1
              AND ($2::INTEGER IS NULL OR id <> $2)
            ",
        )
        .bind(pattern)
        .bind(exclude)
        .fetch_all(self.pool)
        .await?;

        Ok(slugs)
    }

    /// One page of listings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            r"
            FROM storefront.store
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }

    /// Total number of listings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.store")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Listings carrying `tag`, or every tagged listing when `tag` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            r"
            FROM storefront.store
            WHERE CASE WHEN $1::TEXT IS NULL THEN cardinality(tags) > 0
                       ELSE $1 = ANY(tags)
                  END
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(tag)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }

    /// The tag array of every listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tag_sets(&self) -> Result<Vec<Vec<String>>, RepositoryError> {
        let sets = sqlx::query_scalar::<_, Vec<String>>(
            "SELECT tags FROM storefront.store WHERE cardinality(tags) > 0",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(sets)
    }

    /// Listings hearted by `user`, most recently hearted first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_hearted_by(&self, user: UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT s.id, s.name, s.slug, s.description, s.tags, s.lng, s.lat,
                   s.address, s.photo, s.author_id, s.created_at
            FROM storefront.store s
            JOIN storefront.heart h ON h.store_id = s.id
            WHERE h.user_id = $1
            ORDER BY h.created_at DESC
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }

    /// Listings inside a latitude/longitude box around `origin`.
    ///
    /// `lat_delta` and `lng_delta` are half-widths in degrees. A box that
    /// crosses the antimeridian falls back to the latitude band alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn within_box(
        &self,
        origin: GeoPoint,
        lat_delta: f64,
        lng_delta: f64,
    ) -> Result<Vec<Store>, RepositoryError> {
        let min_lng = origin.lng - lng_delta;
        let max_lng = origin.lng + lng_delta;
        let wraps = min_lng < -180.0 || max_lng > 180.0;

        let rows = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            r"
            FROM storefront.store
            WHERE lat BETWEEN $1 AND $2
              AND ($5 OR lng BETWEEN $3 AND $4)
            "
        ))
        .bind(origin.lat - lat_delta)
        .bind(origin.lat + lat_delta)
        .bind(min_lng)
        .bind(max_lng)
        .bind(wraps)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }

    /// Full-text search over name and description, best match first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchHit>, RepositoryError> {
        let rows = sqlx::query_as::<_, SearchRow>(
            r"
            SELECT s.id, s.slug, s.name, s.description, s.photo,
                   ts_rank(s.search, q) AS score
            FROM storefront.store s,
                 websearch_to_tsquery('english', $1) q
            WHERE s.search @@ q
            ORDER BY score DESC, s.id
            LIMIT $2
            ",
        )
        .bind(query)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(SearchHit::from).collect())
    }

    /// Listings with at least `min_reviews` reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_reviewed(&self, min_reviews: i64) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            r"
            FROM storefront.store
            WHERE id IN (
                SELECT store_id
                FROM storefront.review
                GROUP BY store_id
                HAVING COUNT(*) >= $1
            )
            "
        ))
        .bind(min_reviews)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }
}
