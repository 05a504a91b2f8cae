//! Delicious Core - Shared types and listing rules.
//!
//! This crate provides the domain types and business rules used across all
//! Delicious components:
//! - `storefront` - Public-facing store listing site
//! - `cli` - Command-line tools for migrations, seeding and stats
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Repositories load rows, hand them to the rules here, and
//! persist whatever the rules decide.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, ratings, locations, stores and reviews
//! - [`rules`] - Slug assignment, rating and tag aggregation, proximity, ownership
//! - [`error`] - Validation and authorization errors shared by every layer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod rules;
pub mod types;

pub use error::{OwnershipError, ValidationError};
pub use types::*;
