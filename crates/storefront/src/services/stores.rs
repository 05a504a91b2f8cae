//! Store listing service.
//!
//! Composes the store, review and user repositories with the listing rules
//! from `delicious_core::rules`. Every write path runs its checks here, before
//! anything reaches the database.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use delicious_core::rules::{
    self, MIN_REVIEWS_FOR_RANKING, NEAR_LIMIT, NEAR_RADIUS_METERS, TagCount, TopStore,
};
use delicious_core::{
    GeoPoint, Location, OwnershipError, Store, StoreDraft, StoreId, UserId, ValidationError,
};

use crate::db::stores::SearchHit;
use crate::db::{RepositoryError, ReviewRepository, StoreRepository, UserRepository};

/// Listings per page on the store index.
pub const STORES_PER_PAGE: u32 = 6;

/// Maximum number of text search results.
pub const SEARCH_LIMIT: i64 = 5;

/// Attempts at writing a listing before a slug conflict is reported.
const SLUG_ATTEMPTS: usize = 3;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Form input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The actor does not own the listing.
    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// Listing not found.
    #[error("store not found")]
    NotFound,

    /// A unique slug could not be claimed.
    #[error("could not assign a unique slug for '{0}'")]
    SlugConflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A page of listings.
#[derive(Debug, Clone)]
pub struct StorePage {
    pub stores: Vec<Store>,
    /// 1-based page number that was requested.
    pub page: u32,
    /// Total number of pages (at least 1).
    pub pages: u32,
    pub count: i64,
}

impl StorePage {
    /// The requested page is past the end while listings exist.
    #[must_use]
    pub fn is_past_end(&self) -> bool {
        self.stores.is_empty() && self.count > 0 && self.page > self.pages
    }
}

/// Proximity search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyStore {
    pub id: StoreId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub photo: Option<String>,
}

impl From<Store> for NearbyStore {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            slug: store.slug,
            name: store.name,
            description: store.description,
            location: store.location,
            photo: store.photo,
        }
    }
}

/// Store listing service.
pub struct StoreService<'a> {
    stores: StoreRepository<'a>,
    reviews: ReviewRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> StoreService<'a> {
    /// Create a new store service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stores: StoreRepository::new(pool),
            reviews: ReviewRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a listing authored by `author`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SlugConflict` if concurrent writers keep claiming
    /// the chosen slug, `StoreError::Repository` for database failures.
    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, author: UserId, draft: &StoreDraft) -> Result<Store, StoreError> {
        for _ in 0..SLUG_ATTEMPTS {
            let slug = self.prepare_slug(&draft.name, None).await?;
            match self.stores.create(draft, &slug, author).await {
                Ok(store) => {
                    tracing::info!(store_id = %store.id, slug = %store.slug, "Store created");
                    return Ok(store);
                }
                Err(RepositoryError::Conflict(_)) => {
                    tracing::warn!(slug = %slug, "Slug claimed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::SlugConflict(draft.name.clone()))
    }

    /// Update a listing. Only its author may do this.
    ///
    /// The slug is recomputed only when the name changes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the listing doesn't exist and
    /// `StoreError::Ownership` if `actor` is not its author. In both cases
    /// nothing is written.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update(
        &self,
        actor: UserId,
        id: StoreId,
        draft: &StoreDraft,
    ) -> Result<Store, StoreError> {
        let current = self.get_for_edit(actor, id).await?;

        for _ in 0..SLUG_ATTEMPTS {
            let slug = match renamed_base(&current, draft) {
                Some(base) => self.unique_slug(&base, Some(id)).await?,
                None => current.slug.clone(),
            };
            match self.stores.update(id, draft, &slug).await {
                Ok(store) => {
                    tracing::info!(store_id = %store.id, slug = %store.slug, "Store updated");
                    return Ok(store);
                }
                Err(RepositoryError::Conflict(_)) => {
                    tracing::warn!(slug = %slug, "Slug claimed concurrently, retrying");
                }
                Err(RepositoryError::NotFound) => return Err(StoreError::NotFound),
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::SlugConflict(draft.name.clone()))
    }

    /// Slug for `name`, unique among listings other than `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the candidates cannot be loaded.
    pub async fn prepare_slug(
        &self,
        name: &str,
        exclude: Option<StoreId>,
    ) -> Result<String, StoreError> {
        self.unique_slug(&rules::slugify(name), exclude).await
    }

    async fn unique_slug(&self, base: &str, exclude: Option<StoreId>) -> Result<String, StoreError> {
        let existing = self
            .stores
            .slugs_matching(&rules::collision_pattern(base), exclude)
            .await?;
        Ok(rules::assign_slug(base, existing)?)
    }

    /// Add or remove a listing from the user's hearts. Returns the new set.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the listing doesn't exist.
    pub async fn toggle_heart(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Vec<StoreId>, StoreError> {
        self.users
            .toggle_heart(user, store)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => StoreError::NotFound,
                other => other.into(),
            })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Load a listing for editing, checking ownership first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` or `StoreError::Ownership`.
    pub async fn get_for_edit(&self, actor: UserId, id: StoreId) -> Result<Store, StoreError> {
        let store = self.stores.get_by_id(id).await?.ok_or(StoreError::NotFound)?;
        rules::ensure_author(&store, actor)?;
        Ok(store)
    }

    /// Look up a listing by slug.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no listing has this slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Store, StoreError> {
        self.stores
            .get_by_slug(slug)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// One page of listings, newest first. `page` is 1-based; 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn page(&self, page: u32) -> Result<StorePage, StoreError> {
        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(STORES_PER_PAGE);

        let stores = self
            .stores
            .list_page(i64::from(STORES_PER_PAGE), offset)
            .await?;
        let count = self.stores.count().await?;

        Ok(StorePage {
            stores,
            page,
            pages: page_count(count, STORES_PER_PAGE),
            count,
        })
    }

    /// Tag counts plus the listings carrying `tag` (or any tag).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn by_tag(&self, tag: Option<&str>) -> Result<(Vec<TagCount>, Vec<Store>), StoreError> {
        let tags = rules::tag_list(self.stores.tag_sets().await?);
        let stores = self.stores.list_by_tag(tag).await?;
        Ok((tags, stores))
    }

    /// Tag counts across all listings.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn tag_list(&self) -> Result<Vec<TagCount>, StoreError> {
        Ok(rules::tag_list(self.stores.tag_sets().await?))
    }

    /// Top listings by average rating.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn top(&self) -> Result<Vec<TopStore>, StoreError> {
        let min_reviews = i64::try_from(MIN_REVIEWS_FOR_RANKING).unwrap_or(i64::MAX);
        let stores = self.stores.list_reviewed(min_reviews).await?;
        let ids: Vec<StoreId> = stores.iter().map(|s| s.id).collect();
        let reviews = self.reviews.for_stores(&ids).await?;
        Ok(rules::top_stores(&stores, &reviews))
    }

    /// Listings within the search radius of `origin`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn near(&self, origin: GeoPoint) -> Result<Vec<NearbyStore>, StoreError> {
        let (lat_delta, lng_delta) = origin.bounding_deltas(NEAR_RADIUS_METERS);
        let candidates = self.stores.within_box(origin, lat_delta, lng_delta).await?;
        Ok(rules::nearest(origin, candidates, NEAR_RADIUS_METERS, NEAR_LIMIT)
            .into_iter()
            .map(NearbyStore::from)
            .collect())
    }

    /// Full-text search. A blank query matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.stores.search(query, SEARCH_LIMIT).await?)
    }

    /// Listings the user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn hearted(&self, user: UserId) -> Result<Vec<Store>, StoreError> {
        Ok(self.stores.list_hearted_by(user).await?)
    }

    /// IDs of the listings the user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn heart_ids(&self, user: UserId) -> Result<Vec<StoreId>, StoreError> {
        Ok(self.users.hearts(user).await?)
    }
}

/// The slug base to reassign when an update renames the listing.
///
/// `None` keeps the current slug.
fn renamed_base(current: &Store, draft: &StoreDraft) -> Option<String> {
    (current.name != draft.name).then(|| rules::slugify(&draft.name))
}

/// Number of pages needed for `count` items, never less than 1.
fn page_count(count: i64, per_page: u32) -> u32 {
    let per_page = i64::from(per_page.max(1));
    let pages = (count.max(0) + per_page - 1) / per_page;
    u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn store(name: &str, slug: &str) -> Store {
        Store {
            id: StoreId::new(1),
            name: name.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            tags: vec![],
            created_at: Utc::now(),
            location: Location::new(GeoPoint::new(0.0, 0.0).unwrap(), "1 Main St").unwrap(),
            photo: None,
            author: UserId::new(1),
        }
    }

    fn draft(name: &str) -> StoreDraft {
        StoreDraft::new(name, "new description", ["Wifi"], 1.0, 1.0, "2 Main St").unwrap()
    }

    #[test]
    fn test_slug_kept_when_name_unchanged() {
        let current = store("Sar's Diner", "sar-s-diner-2");
        assert_eq!(renamed_base(&current, &draft("Sar's Diner")), None);
        // Surrounding whitespace is trimmed by the draft, so this is not a rename.
        assert_eq!(renamed_base(&current, &draft("  Sar's Diner ")), None);
    }

    #[test]
    fn test_slug_recomputed_on_rename() {
        let current = store("Sar's Diner", "sar-s-diner");
        assert_eq!(
            renamed_base(&current, &draft("Wes's Diner")),
            Some("wes-s-diner".to_string())
        );
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 6), 1);
        assert_eq!(page_count(6, 6), 1);
        assert_eq!(page_count(7, 6), 2);
        assert_eq!(page_count(13, 6), 3);
    }

    #[test]
    fn test_past_end_detection() {
        let page = StorePage {
            stores: vec![],
            page: 5,
            pages: 2,
            count: 8,
        };
        assert!(page.is_past_end());

        let empty_site = StorePage {
            stores: vec![],
            page: 1,
            pages: 1,
            count: 0,
        };
        assert!(!empty_site.is_past_end());
    }

    #[test]
    fn test_nearby_projection() {
        let s = store("Cafe", "cafe");
        let near = NearbyStore::from(s.clone());
        let json = serde_json::to_value(&near).unwrap();
        assert_eq!(json["slug"], "cafe");
        assert_eq!(json["location"]["type"], "Point");
        assert!(json.get("author").is_none());
        assert!(json.get("tags").is_none());
    }
}
