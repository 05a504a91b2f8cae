//! Seed the storefront database from a YAML file.
//!
//! Everything goes through the storefront services, so passwords are hashed,
//! slugs are assigned and reviews are validated exactly as they are for
//! requests. Users that already exist are logged in with the seeded password
//! instead of being created again.
//!
//! ```yaml
//! users:
//!   - name: Wes
//!     email: wes@example.com
//!     password: wes-password
//! stores:
//!   - name: Coffee Corner
//!     description: Espresso and pastries
//!     tags: [Wifi, Vegetarian]
//!     address: 1 King St W, Hamilton
//!     lng: -79.87
//!     lat: 43.25
//!     author: wes@example.com
//! reviews:
//!   - store: Coffee Corner
//!     author: wes@example.com
//!     text: Great flat white.
//!     rating: 5
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use delicious_core::{StoreDraft, StoreId, UserId, ValidationError};
use delicious_storefront::services::{
    AuthError, AuthService, ReviewService, StoreError, StoreService,
};

use super::{CommandError, connect};

// =============================================================================
// Seed File
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub stores: Vec<SeedStore>,
    #[serde(default)]
    pub reviews: Vec<SeedReview>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedStore {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
    /// Email of the listing's author.
    pub author: String,
    /// Filename of a photo already present in the upload directory.
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedReview {
    /// Name of a store in the same file.
    pub store: String,
    /// Email of the reviewer.
    pub author: String,
    pub text: String,
    pub rating: i64,
}

impl SeedFile {
    /// Cross-reference checks that don't need a database.
    ///
    /// Returns one message per problem; an empty list means the file is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let emails: HashSet<String> = self.users.iter().map(|u| u.email.to_lowercase()).collect();
        let stores: HashSet<&str> = self.stores.iter().map(|s| s.name.as_str()).collect();

        for store in &self.stores {
            if !emails.contains(&store.author.to_lowercase()) {
                errors.push(format!("store '{}': unknown author {}", store.name, store.author));
            }
            if let Err(e) = store.draft() {
                errors.push(format!("store '{}': {e}", store.name));
            }
        }

        for (i, review) in self.reviews.iter().enumerate() {
            if !stores.contains(review.store.as_str()) {
                errors.push(format!("review {}: unknown store {}", i + 1, review.store));
            }
            if !emails.contains(&review.author.to_lowercase()) {
                errors.push(format!("review {}: unknown author {}", i + 1, review.author));
            }
        }

        errors
    }
}

impl SeedStore {
    fn draft(&self) -> Result<StoreDraft, ValidationError> {
        Ok(StoreDraft::new(
            &self.name,
            &self.description,
            &self.tags,
            self.lng,
            self.lat,
            &self.address,
        )?
        .with_photo(self.photo.clone()))
    }
}

// =============================================================================
// Command
// =============================================================================

/// Seed users, stores and reviews from `file_path`.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, fails validation, or
/// a database operation fails.
pub async fn from_file(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed data from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidSeed(errors.len()));
    }

    let pool = connect().await?;
    let auth = AuthService::new(&pool);
    let stores = StoreService::new(&pool);
    let reviews = ReviewService::new(&pool);

    let mut users: HashMap<String, UserId> = HashMap::new();
    for user in &seed.users {
        let created = match auth
            .register(&user.email, &user.name, &user.password, &user.password)
            .await
        {
            Ok(created) => created,
            Err(AuthError::UserAlreadyExists) => {
                info!(email = %user.email, "User exists, reusing");
                auth.login(&user.email, &user.password).await?
            }
            Err(e) => return Err(e.into()),
        };
        users.insert(user.email.to_lowercase(), created.id);
    }

    let mut store_ids: HashMap<&str, StoreId> = HashMap::new();
    for store in &seed.stores {
        let author = lookup_user(&users, &store.author)?;
        let draft = store.draft().map_err(StoreError::from)?;
        let created = stores.create(author, &draft).await?;
        info!(slug = %created.slug, "Store created");
        store_ids.insert(store.name.as_str(), created.id);
    }

    for review in &seed.reviews {
        let author = lookup_user(&users, &review.author)?;
        let store = *store_ids
            .get(review.store.as_str())
            .ok_or_else(|| CommandError::UnknownStore(review.store.clone()))?;
        reviews.add(author, store, &review.text, review.rating).await?;
    }

    pool.close().await;

    info!("Seeding complete!");
    info!("  Users: {}", seed.users.len());
    info!("  Stores: {}", seed.stores.len());
    info!("  Reviews: {}", seed.reviews.len());
    Ok(())
}

fn lookup_user(users: &HashMap<String, UserId>, email: &str) -> Result<UserId, CommandError> {
    users
        .get(&email.to_lowercase())
        .copied()
        .ok_or_else(|| CommandError::UnknownUser(email.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
users:
  - name: Wes
    email: wes@example.com
    password: wes-password
stores:
  - name: Coffee Corner
    description: Espresso
    tags: [Wifi]
    address: 1 King St W
    lng: -79.87
    lat: 43.25
    author: WES@example.com
reviews:
  - store: Coffee Corner
    author: wes@example.com
    text: Great.
    rating: 5
";

    #[test]
    fn test_parse_and_validate_sample() {
        let seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(seed.users.len(), 1);
        assert_eq!(seed.stores.first().unwrap().tags, vec!["Wifi"]);
        assert!(seed.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_unknown_references() {
        let mut seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        seed.reviews.push(SeedReview {
            store: "Nowhere".to_owned(),
            author: "ghost@example.com".to_owned(),
            text: "?".to_owned(),
            rating: 3,
        });

        let errors = seed.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("unknown store Nowhere")));
        assert!(errors.iter().any(|e| e.contains("ghost@example.com")));
    }

    #[test]
    fn test_validate_reports_bad_coordinates() {
        let mut seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        seed.stores.first_mut().unwrap().lat = 123.0;
        assert_eq!(seed.validate().len(), 1);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed: SeedFile = serde_yaml::from_str("users: []").unwrap();
        assert!(seed.stores.is_empty());
        assert!(seed.reviews.is_empty());
    }
}
