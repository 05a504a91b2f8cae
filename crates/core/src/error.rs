//! Errors raised by core validation and rules.

use thiserror::Error;

use crate::types::{StoreId, UserId};

/// A required field is missing or malformed.
///
/// The message is shown to the user unchanged, so every variant reads as a
/// complete sentence fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was empty after trimming.
    #[error("{0}")]
    Required(&'static str),

    /// Email address could not be parsed.
    #[error("Invalid email address: {0}")]
    Email(#[from] crate::types::EmailError),

    /// Rating outside 1..=5.
    #[error("Rating must be between {min} and {max} (got {got})")]
    RatingOutOfRange {
        /// Smallest accepted rating.
        min: i16,
        /// Largest accepted rating.
        max: i16,
        /// Rejected value.
        got: i64,
    },

    /// Coordinates are not finite or fall outside the valid range.
    #[error("Invalid coordinates: {0}")]
    Coordinates(String),

    /// A free-form field failed a format check.
    #[error("{0}")]
    Invalid(String),
}

/// An actor tried to mutate a listing they do not own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("You must own a store in order to edit it! (store {store}, user {actor})")]
pub struct OwnershipError {
    /// Listing that was targeted.
    pub store: StoreId,
    /// User who attempted the change.
    pub actor: UserId,
}
