//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use delicious_core::{Email, UserId};

/// Default avatar size in pixels.
pub const GRAVATAR_SIZE: u32 = 200;

/// A site user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (trimmed, lowercase).
    pub email: Email,
    /// Display name.
    pub name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Gravatar image URL, derived from the email on every read.
    #[must_use]
    pub fn gravatar(&self) -> String {
        gravatar_url(&self.email, GRAVATAR_SIZE)
    }
}

/// Gravatar URL for an email address.
///
/// Uses the SHA-256 of the normalized address.
#[must_use]
pub fn gravatar_url(email: &Email, size: u32) -> String {
    let digest = Sha256::digest(email.as_str().as_bytes());
    format!("https://gravatar.com/avatar/{}?s={size}", hex::encode(digest))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gravatar_uses_normalized_email() {
        let a = Email::parse("Sar@Example.com ").unwrap();
        let b = Email::parse("sar@example.com").unwrap();
        assert_eq!(gravatar_url(&a, 200), gravatar_url(&b, 200));
    }

    #[test]
    fn test_gravatar_shape() {
        let email = Email::parse("sar@example.com").unwrap();
        let url = gravatar_url(&email, 80);
        assert!(url.starts_with("https://gravatar.com/avatar/"));
        assert!(url.ends_with("?s=80"));
        // 64 hex chars of SHA-256
        let hash = url
            .trim_start_matches("https://gravatar.com/avatar/")
            .trim_end_matches("?s=80");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
