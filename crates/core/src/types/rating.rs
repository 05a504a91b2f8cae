//! Review rating.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A review rating in the inclusive range 1-5.
///
/// Deserialization goes through [`Rating::new`], so an out-of-range value can
/// never be held by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Rating(i16);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: i16 = 1;
    /// Highest accepted rating.
    pub const MAX: i16 = 5;

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::RatingOutOfRange` outside 1..=5.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            // In range, so the narrowing cannot truncate.
            #[allow(clippy::cast_possible_truncation)]
            Ok(Self(value as i16))
        } else {
            Err(ValidationError::RatingOutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                got: value,
            })
        }
    }

    /// The rating as a small integer (database representation).
    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }

    /// The rating as a float, for averaging.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_bounds() {
        assert_eq!(Rating::new(1).unwrap().get(), 1);
        assert_eq!(Rating::new(5).unwrap().get(), 5);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            Rating::new(0),
            Err(ValidationError::RatingOutOfRange { got: 0, .. })
        ));
        assert!(Rating::new(6).is_err());
        assert!(Rating::new(-3).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Rating = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }
}
