//! Store reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Rating, ReviewId, StoreId, UserId};
use crate::error::ValidationError;

/// A persisted review. Reviews are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub created_at: DateTime<Utc>,
    pub author: UserId,
    pub store: StoreId,
    pub text: String,
    pub rating: Rating,
}

/// Validated review input. Author and store come from the request context,
/// not from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub text: String,
    pub rating: Rating,
}

impl NewReview {
    /// Validate raw review input.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Required` for blank text and
    /// `ValidationError::RatingOutOfRange` for a rating outside 1..=5.
    pub fn new(text: &str, rating: i64) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Required("Your review must have text!"));
        }
        Ok(Self {
            text: text.to_owned(),
            rating: Rating::new(rating)?,
        })
    }
}
