//! Top-stores ranking.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{Review, Store, StoreId};

/// A store needs at least this many reviews to be ranked.
pub const MIN_REVIEWS_FOR_RANKING: usize = 2;

/// Maximum number of ranked stores.
pub const TOP_STORES_LIMIT: usize = 10;

/// One row of the top-stores ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopStore {
    pub id: StoreId,
    pub photo: Option<String>,
    pub name: String,
    pub slug: String,
    pub average_rating: f64,
    pub reviews: Vec<Review>,
}

impl TopStore {
    #[must_use]
    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }
}

/// Rank stores by mean review rating.
///
/// Only stores with at least [`MIN_REVIEWS_FOR_RANKING`] reviews are
/// considered. The result is sorted by mean rating, highest first, and holds
/// at most [`TOP_STORES_LIMIT`] entries. Reviews for stores not in `stores`
/// are ignored.
#[must_use]
pub fn top_stores(stores: &[Store], reviews: &[Review]) -> Vec<TopStore> {
    let mut by_store: HashMap<StoreId, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_store.entry(review.store).or_default().push(review.clone());
    }

    let mut ranked: Vec<TopStore> = stores
        .iter()
        .filter_map(|store| {
            let reviews = by_store.remove(&store.id)?;
            if reviews.len() < MIN_REVIEWS_FOR_RANKING {
                return None;
            }
            let total: f64 = reviews.iter().map(|r| r.rating.as_f64()).sum();
            // Review counts are far below 2^52.
            #[allow(clippy::cast_precision_loss)]
            let average_rating = total / reviews.len() as f64;

            Some(TopStore {
                id: store.id,
                photo: store.photo.clone(),
                name: store.name.clone(),
                slug: store.slug.clone(),
                average_rating,
                reviews,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    ranked.truncate(TOP_STORES_LIMIT);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::{GeoPoint, Location, Rating, ReviewId, UserId};

    fn store(id: i32, name: &str) -> Store {
        Store {
            id: StoreId::new(id),
            name: name.to_owned(),
            slug: name.to_lowercase(),
            description: String::new(),
            tags: Vec::new(),
            created_at: Utc::now(),
            location: Location::new(GeoPoint::new(0.0, 0.0).unwrap(), "x").unwrap(),
            photo: None,
            author: UserId::new(1),
        }
    }

    fn reviews_for(store: i32, ratings: &[i64]) -> Vec<Review> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, r)| Review {
                id: ReviewId::new(store * 100 + i32::try_from(i).unwrap()),
                created_at: Utc::now(),
                author: UserId::new(2),
                store: StoreId::new(store),
                text: "ok".to_owned(),
                rating: Rating::new(*r).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_single_review_is_not_ranked() {
        let stores = vec![store(1, "A")];
        let reviews = reviews_for(1, &[5]);
        assert!(top_stores(&stores, &reviews).is_empty());
    }

    #[test]
    fn test_two_reviews_average() {
        let stores = vec![store(1, "A")];
        let reviews = reviews_for(1, &[3, 5]);
        let top = top_stores(&stores, &reviews);
        assert_eq!(top.len(), 1);
        assert!((top[0].average_rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(top[0].review_count(), 2);
    }

    #[test]
    fn test_sorted_by_average_descending() {
        let stores = vec![store(1, "A"), store(2, "B"), store(3, "C")];
        let mut reviews = reviews_for(1, &[4, 4]);
        reviews.extend(reviews_for(2, &[5, 5]));
        reviews.extend(reviews_for(3, &[2, 3]));

        let names: Vec<String> = top_stores(&stores, &reviews)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let stores: Vec<Store> = (1..=15).map(|i| store(i, &format!("S{i}"))).collect();
        let reviews: Vec<Review> = (1..=15).flat_map(|i| reviews_for(i, &[3, 4])).collect();
        assert_eq!(top_stores(&stores, &reviews).len(), TOP_STORES_LIMIT);
    }

    #[test]
    fn test_orphan_reviews_ignored() {
        let stores = vec![store(1, "A")];
        let reviews = reviews_for(9, &[5, 5, 5]);
        assert!(top_stores(&stores, &reviews).is_empty());
    }
}
