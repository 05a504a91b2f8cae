//! Listing ownership.

use crate::error::OwnershipError;
use crate::types::{Store, UserId};

/// Only the author of a listing may edit it.
///
/// # Errors
///
/// Returns `OwnershipError` if `actor` did not author `store`.
pub fn ensure_author(store: &Store, actor: UserId) -> Result<(), OwnershipError> {
    if store.is_authored_by(actor) {
        Ok(())
    } else {
        Err(OwnershipError {
            store: store.id,
            actor,
        })
    }
}
