//! Listing rules.
//!
//! Pure functions over in-memory records. Repositories gather the inputs
//! (pushing cheap filters into SQL where they can) and the rules decide.

pub mod ownership;
pub mod proximity;
pub mod ratings;
pub mod slug;
pub mod tags;

pub use ownership::ensure_author;
pub use proximity::{Located, NEAR_LIMIT, NEAR_RADIUS_METERS, nearest};
pub use ratings::{MIN_REVIEWS_FOR_RANKING, TOP_STORES_LIMIT, TopStore, top_stores};
pub use slug::{assign_slug, collision_pattern, slugify};
pub use tags::{TagCount, tag_list};
