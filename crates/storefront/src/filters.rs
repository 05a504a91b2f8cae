//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, Utc};

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a 1-5 rating as filled and empty stars.
///
/// Usage in templates: `{{ review.rating|stars }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_string(&rating.to_string()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn star_string(rating: &str) -> String {
    let filled = rating
        .trim()
        .parse::<f64>()
        .map_or(0, |r| r.round().clamp(0.0, 5.0) as usize);
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Human-readable age of a timestamp, e.g. "3 days ago".
#[must_use]
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);

    let (amount, unit) = if delta.num_days() >= 365 {
        (delta.num_days() / 365, "year")
    } else if delta.num_days() >= 30 {
        (delta.num_days() / 30, "month")
    } else if delta.num_days() >= 1 {
        (delta.num_days(), "day")
    } else if delta.num_hours() >= 1 {
        (delta.num_hours(), "hour")
    } else if delta.num_minutes() >= 1 {
        (delta.num_minutes(), "minute")
    } else {
        return "just now".to_string();
    };

    if amount == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{amount} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn test_star_string() {
        assert_eq!(star_string("5"), "★★★★★");
        assert_eq!(star_string("3"), "★★★☆☆");
        assert_eq!(star_string("4.4"), "★★★★☆");
        assert_eq!(star_string("nope"), "☆☆☆☆☆");
    }

    #[test]
    fn test_relative_age() {
        let now = Utc::now();
        assert_eq!(relative_age(now, now), "just now");
        assert_eq!(relative_age(now - TimeDelta::minutes(1), now), "1 minute ago");
        assert_eq!(relative_age(now - TimeDelta::hours(5), now), "5 hours ago");
        assert_eq!(relative_age(now - TimeDelta::days(40), now), "1 month ago");
        assert_eq!(relative_age(now - TimeDelta::days(800), now), "2 years ago");
    }
}
