//! User repository for database operations.
//!
//! Accounts, password hashes, reset tokens and the heart (favorite) set.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::{Email, StoreId, UserId};

use super::{RepositoryError, map_constraint_error};
use crate::models::user::User;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// User row joined with credential columns.
#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// User row joined with reset token expiry.
#[derive(Debug, sqlx::FromRow)]
struct UserWithResetRow {
    #[sqlx(flatten)]
    user: UserRow,
    reset_password_expires: Option<DateTime<Utc>>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, created_at, updated_at
            FROM storefront.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, created_at, updated_at
            FROM storefront.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new user with email, display name and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.user (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "email"))?;

        row.try_into()
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, email, name, created_at, updated_at, password_hash
            FROM storefront.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some((r.user.try_into()?, r.password_hash)))
    }

    /// Update a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email belongs to another user.
    pub async fn update_profile(
        &self,
        id: UserId,
        email: &Email,
        name: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE storefront.user
            SET email = $2, name = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(email.as_str())
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "email"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Store a reset token for the user with this email.
    ///
    /// Returns `None` if no user has this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_reset_token(
        &self,
        email: &Email,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE storefront.user
            SET reset_password_token = $2, reset_password_expires = $3, updated_at = NOW()
            WHERE email = $1
            RETURNING id, email, name, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(token)
        .bind(expires)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Look up a user by reset token, returning the token's expiry.
    ///
    /// Expiry is not checked here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<(User, Option<DateTime<Utc>>)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithResetRow>(
            r"
            SELECT id, email, name, created_at, updated_at, reset_password_expires
            FROM storefront.user
            WHERE reset_password_token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some((r.user.try_into()?, r.reset_password_expires)))
    }

    /// Replace the password hash and clear any reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.user
            SET password_hash = $2,
                reset_password_token = NULL,
                reset_password_expires = NULL,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Hearts
    // =========================================================================

    /// IDs of the stores a user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearts(&self, user_id: UserId) -> Result<Vec<StoreId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, StoreId>(
            r"
            SELECT store_id
            FROM storefront.heart
            WHERE user_id = $1
            ORDER BY store_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Add the store to the user's hearts if absent, remove it if present.
    ///
    /// The toggle is one statement, so concurrent toggles never leave a
    /// duplicate row. Returns the heart set after the toggle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn toggle_heart(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Vec<StoreId>, RepositoryError> {
        sqlx::query(
            r"
            WITH removed AS (
                DELETE FROM storefront.heart
                WHERE user_id = $1 AND store_id = $2
                RETURNING 1
            )
            INSERT INTO storefront.heart (user_id, store_id)
            SELECT $1, $2
            WHERE NOT EXISTS (SELECT 1 FROM removed)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(store_id)
        .execute(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "heart"))?;

        self.hearts(user_id).await
    }
}
