//! Storefront services against a real database.
//!
//! These tests require a migrated `PostgreSQL` database named by
//! `STOREFRONT_DATABASE_URL` (run `dl-cli migrate` first).
//!
//! Run with: cargo test -p delicious-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use chrono::{TimeDelta, Utc};
use sqlx::PgPool;

use delicious_core::rules::slugify;
use delicious_core::{Email, StoreDraft, UserId};
use delicious_integration_tests::{storefront_pool, unique_email};
use delicious_storefront::db::{RepositoryError, StoreRepository, UserRepository};
use delicious_storefront::services::{AuthError, AuthService, StoreError, StoreService};

async fn new_user(pool: &PgPool, name: &str) -> UserId {
    AuthService::new(pool)
        .register(&unique_email(name), name, "correct horse", "correct horse")
        .await
        .unwrap()
        .id
}

fn draft(name: &str) -> StoreDraft {
    StoreDraft::new(
        name,
        "Integration test listing",
        ["Wifi"],
        -79.8711,
        43.2557,
        "1 King St W, Hamilton",
    )
    .unwrap()
}

// ============================================================================
// Slugs
// ============================================================================

#[tokio::test]
#[ignore = "Requires migrated storefront database"]
async fn test_same_name_listings_get_unique_slugs() {
    let pool = storefront_pool().await;
    let author = new_user(&pool, "Slugger").await;
    let stores = StoreService::new(&pool);

    let name = format!("Slug Test {}", uuid::Uuid::new_v4().simple());
    let first = stores.create(author, &draft(&name)).await.unwrap();
    let second = stores.create(author, &draft(&name)).await.unwrap();

    assert_ne!(first.slug, second.slug);
    assert_eq!(second.slug, format!("{}-2", first.slug));
}

#[tokio::test]
#[ignore = "Requires migrated storefront database"]
async fn test_taken_slug_is_a_repository_conflict() {
    let pool = storefront_pool().await;
    let author = new_user(&pool, "Claimer").await;
    let repo = StoreRepository::new(&pool);

    let name = format!("Claimed {}", uuid::Uuid::new_v4().simple());
    let slug = slugify(&name);
    repo.create(&draft(&name), &slug, author).await.unwrap();

    let again = repo.create(&draft(&name), &slug, author).await;
    assert!(matches!(again, Err(RepositoryError::Conflict(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
#[ignore = "Requires migrated storefront database"]
async fn test_concurrent_same_name_creates_retry_to_distinct_slugs() {
    let pool = storefront_pool().await;
    let author = new_user(&pool, "Racer").await;
    let name = format!("Race {}", uuid::Uuid::new_v4().simple());

    // Each loser of a slug race loses to a different finished writer, so
    // three writers always fit in the retry budget.
    let spawn_create = || {
        let pool = pool.clone();
        let draft = draft(&name);
        tokio::spawn(async move { StoreService::new(&pool).create(author, &draft).await })
    };
    let (a, b, c) = tokio::join!(spawn_create(), spawn_create(), spawn_create());

    let mut slugs: Vec<String> = [a, b, c]
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().slug)
        .collect();
    slugs.sort();

    let base = slugify(&name);
    assert_eq!(slugs, vec![base.clone(), format!("{base}-2"), format!("{base}-3")]);
}

#[tokio::test]
#[ignore = "Requires migrated storefront database"]
async fn test_update_without_rename_keeps_slug() {
    let pool = storefront_pool().await;
    let author = new_user(&pool, "Keeper").await;
    let stores = StoreService::new(&pool);

    let name = format!("Keep Slug {}", uuid::Uuid::new_v4().simple());
    let created = stores.create(author, &draft(&name)).await.unwrap();
    // A same-named listing now exists; re-saving must not bump the original.
    stores.create(author, &draft(&name)).await.unwrap();

    let mut changed = draft(&name);
    changed.description = "New description".to_string();
    let updated = stores.update(author, created.id, &changed).await.unwrap();

    assert_eq!(updated.slug, created.slug);
    assert_eq!(updated.description, "New description");
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
#[ignore = "Requires migrated storefront database"]
async fn test_non_author_update_is_rejected_and_nothing_changes() {
    let pool = storefront_pool().await;
    let author = new_user(&pool, "Owner").await;
    let intruder = new_user(&pool, "Intruder").await;
    let stores = StoreService::new(&pool);

    let name = format!("Owned {}", uuid::Uuid::new_v4().simple());
    let created = stores.create(author, &draft(&name)).await.unwrap();

    let result = stores.update(intruder, created.id, &draft("Hijacked")).await;
    assert!(matches!(result, Err(StoreError::Ownership(_))));

    let reloaded = stores.get_by_slug(&created.slug).await.unwrap();
    assert_eq!(reloaded, created);
}

// ============================================================================
// Hearts
// ============================================================================

#[tokio::test]
#[ignore = "Requires migrated storefront database"]
async fn test_heart_toggle_twice_restores_the_set() {
    let pool = storefront_pool().await;
    let user = new_user(&pool, "Hearty").await;
    let stores = StoreService::new(&pool);

    let keep = stores.create(user, &draft("Heart Keep")).await.unwrap();
    let flip = stores.create(user, &draft("Heart Flip")).await.unwrap();
    stores.toggle_heart(user, keep.id).await.unwrap();
    let before = stores.heart_ids(user).await.unwrap();

    let after_on = stores.toggle_heart(user, flip.id).await.unwrap();
    assert!(after_on.contains(&flip.id));

    let after_off = stores.toggle_heart(user, flip.id).await.unwrap();
    assert_eq!(after_off, before);
}

// ============================================================================
// Password Reset
// ============================================================================

#[tokio::test]
#[ignore = "Requires migrated storefront database"]
async fn test_expired_reset_token_is_treated_as_unknown() {
    let pool = storefront_pool().await;
    let email = unique_email("expired");
    AuthService::new(&pool)
        .register(&email, "Expired", "correct horse", "correct horse")
        .await
        .unwrap();

    let token = "ab".repeat(20);
    UserRepository::new(&pool)
        .set_reset_token(
            &Email::parse(&email).unwrap(),
            &token,
            Utc::now() - TimeDelta::minutes(1),
        )
        .await
        .unwrap();

    let auth = AuthService::new(&pool);
    assert!(matches!(
        auth.user_for_reset_token(&token).await,
        Err(AuthError::InvalidResetToken)
    ));
    assert!(matches!(
        auth.user_for_reset_token("no-such-token").await,
        Err(AuthError::InvalidResetToken)
    ));
}

#[tokio::test]
#[ignore = "Requires migrated storefront database"]
async fn test_reset_consumes_the_token() {
    let pool = storefront_pool().await;
    let email = unique_email("reset");
    let auth = AuthService::new(&pool);
    auth.register(&email, "Reset", "correct horse", "correct horse")
        .await
        .unwrap();

    let issued = auth.forgot_password(&email).await.unwrap().unwrap();
    assert_eq!(issued.token.len(), 40);

    auth.reset_password(&issued.token, "battery staple", "battery staple")
        .await
        .unwrap();
    assert!(auth.login(&email, "battery staple").await.is_ok());
    assert!(matches!(
        auth.user_for_reset_token(&issued.token).await,
        Err(AuthError::InvalidResetToken)
    ));
}
