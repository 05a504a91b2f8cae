//! Core types for Delicious.
//!
//! This module provides type-safe wrappers and domain records for users,
//! stores and reviews.

pub mod email;
pub mod id;
pub mod location;
pub mod rating;
pub mod review;
pub mod store;

pub use email::{Email, EmailError};
pub use id::*;
pub use location::{GeoPoint, Location};
pub use rating::Rating;
pub use review::{NewReview, Review};
pub use store::{Store, StoreDraft};
