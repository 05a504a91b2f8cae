//! Slug assignment.
//!
//! A slug is derived from the store name and made unique against the slugs of
//! every *other* listing. Collisions are resolved with a numeric suffix:
//! `sar`, `sar-2`, `sar-3`, ...
//!
//! The suffix is one past the largest suffix already in use (the bare base
//! counts as 1), not one past the number of matches. Counting matches hands
//! out a duplicate as soon as a lower-numbered listing is deleted.

use regex::{Captures, RegexBuilder};

use crate::error::ValidationError;

/// Lower-case, ASCII-transliterate and hyphenate a store name.
///
/// ```
/// use delicious_core::rules::slugify;
///
/// assert_eq!(slugify("Café  Olé!"), "cafe-ole");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    slug::slugify(name)
}

/// Case-insensitive pattern selecting slugs that collide with `base`.
///
/// The same pattern is handed to PostgreSQL's `~*` operator and compiled
/// in-process by [`assign_slug`]: `^(base)(-[0-9]*)?$`.
#[must_use]
pub fn collision_pattern(base: &str) -> String {
    let mut escaped = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_punctuation() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("^({escaped})(-[0-9]*)?$")
}

/// Pick a slug for `base` that is unused by any of `existing`.
///
/// `existing` must not include the listing being saved. Entries that do not
/// collide with `base` are ignored, so callers may over-fetch.
///
/// # Errors
///
/// Returns `ValidationError::Invalid` if `base` is too large to build a
/// collision pattern from.
pub fn assign_slug<I, S>(base: &str, existing: I) -> Result<String, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pattern = RegexBuilder::new(&collision_pattern(base))
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            ValidationError::Invalid(format!("Store name cannot be turned into a link: {e}"))
        })?;

    let highest = existing
        .into_iter()
        .filter_map(|slug| {
            pattern
                .captures(slug.as_ref())
                .map(|caps| collision_suffix(&caps))
        })
        .max();

    Ok(match highest {
        None => base.to_owned(),
        Some(n) => format!("{base}-{}", n.saturating_add(1)),
    })
}

/// Suffix number of a colliding slug.
///
/// The bare base and a dangling `base-` both count as 1.
fn collision_suffix(caps: &Captures<'_>) -> u64 {
    let digits = caps
        .get(2)
        .map_or("", |m| m.as_str().trim_start_matches('-'));
    if digits.is_empty() {
        return 1;
    }
    digits.parse::<u64>().map_or(u64::MAX - 1, |n| n.max(1))
}
