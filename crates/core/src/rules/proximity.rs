//! Proximity search.

use crate::types::{GeoPoint, Location, Store};

/// Search radius for nearby stores.
pub const NEAR_RADIUS_METERS: f64 = 20_000.0;

/// Maximum number of nearby stores returned.
pub const NEAR_LIMIT: usize = 10;

/// Anything with a position on the map.
pub trait Located {
    fn point(&self) -> GeoPoint;
}

impl Located for GeoPoint {
    fn point(&self) -> GeoPoint {
        *self
    }
}

impl Located for Location {
    fn point(&self) -> GeoPoint {
        Self::point(self)
    }
}

impl Located for Store {
    fn point(&self) -> GeoPoint {
        self.location.point()
    }
}

/// Keep candidates within `radius_m` of `origin`, nearest first, at most
/// `limit` of them.
///
/// Candidates are usually pre-filtered by a bounding box in SQL; this does the
/// exact great-circle check.
#[must_use]
pub fn nearest<T: Located>(origin: GeoPoint, candidates: Vec<T>, radius_m: f64, limit: usize) -> Vec<T> {
    let mut within: Vec<(f64, T)> = candidates
        .into_iter()
        .map(|c| (origin.distance_m(&c.point()), c))
        .filter(|(d, _)| *d <= radius_m)
        .collect();

    within.sort_by(|a, b| a.0.total_cmp(&b.0));
    within.truncate(limit);
    within.into_iter().map(|(_, c)| c).collect()
}
