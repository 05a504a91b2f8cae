//! Store listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GeoPoint, Location, StoreId, UserId};
use crate::error::ValidationError;

/// A persisted store listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: UserId,
}

impl Store {
    /// Whether `user` is the author of this listing.
    #[must_use]
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author == user
    }
}

/// Validated, normalized input for creating or updating a listing.
///
/// The slug is not part of the draft: it is derived from `name` right before
/// the listing is written.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDraft {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub location: Location,
    /// New photo filename. `None` keeps the current photo on update.
    pub photo: Option<String>,
}

impl StoreDraft {
    /// Validate and normalize raw form input.
    ///
    /// Trims name, description and address; trims tags, drops empty ones and
    /// removes duplicates while keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name or address is blank or the
    /// coordinates are invalid.
    pub fn new(
        name: &str,
        description: &str,
        tags: impl IntoIterator<Item = impl AsRef<str>>,
        lng: f64,
        lat: f64,
        address: &str,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("Please enter a store name."));
        }

        let location = Location::new(GeoPoint::new(lng, lat)?, address)?;

        Ok(Self {
            name: name.to_owned(),
            description: description.trim().to_owned(),
            tags: normalize_tags(tags),
            location,
            photo: None,
        })
    }

    /// Attach an uploaded photo filename.
    #[must_use]
    pub fn with_photo(mut self, photo: Option<String>) -> Self {
        self.photo = photo;
        self
    }
}

fn normalize_tags(tags: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_owned());
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_trims_and_dedupes() {
        let draft = StoreDraft::new(
            "  Sar's Cafe ",
            " Coffee\n",
            ["Wifi", " Wifi", "", "Open Late"],
            -79.4,
            43.6,
            "1 King St",
        )
        .unwrap();

        assert_eq!(draft.name, "Sar's Cafe");
        assert_eq!(draft.description, "Coffee");
        assert_eq!(draft.tags, vec!["Wifi", "Open Late"]);
        assert_eq!(draft.location.address, "1 King St");
        assert!(draft.photo.is_none());
    }

    #[test]
    fn test_draft_requires_name() {
        let err = StoreDraft::new(" ", "", Vec::<String>::new(), 0.0, 0.0, "x").unwrap_err();
        assert_eq!(err, ValidationError::Required("Please enter a store name."));
    }

    #[test]
    fn test_draft_requires_address() {
        let err = StoreDraft::new("Cafe", "", Vec::<String>::new(), 0.0, 0.0, "").unwrap_err();
        assert!(matches!(err, ValidationError::Required(_)));
    }

    #[test]
    fn test_draft_rejects_bad_coordinates() {
        let err =
            StoreDraft::new("Cafe", "", Vec::<String>::new(), 200.0, 0.0, "x").unwrap_err();
        assert!(matches!(err, ValidationError::Coordinates(_)));
    }
}
