/// User model and credential store operations
///
/// Users carry a username, an Argon2id password hash, and an optional
/// password-reset token with its expiry. Username uniqueness is enforced by
/// the store's unique constraint; a violation surfaces as a database error
/// the boundary maps to a conflict.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     reset_token TEXT,
///     reset_token_expiry TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user id
    pub id: Uuid,

    /// Username; unique and case-sensitive
    pub username: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    /// Outstanding password-reset token, if one was requested
    pub reset_token: Option<String>,

    /// When the reset token stops being redeemable
    pub reset_token_expiry: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Username (validated by the caller: trimmed length >= 3)
    pub username: String,

    /// Argon2id password hash, not a plaintext password
    pub password_hash: String,
}

/// Validates a username
///
/// At least 3 characters after trimming surrounding whitespace.
///
/// # Example
///
/// ```
/// use taskvault_shared::models::user::validate_username;
///
/// assert!(validate_username("alice"));
/// assert!(!validate_username("ab"));
/// assert!(!validate_username("  a  "));
/// ```
pub fn validate_username(username: &str) -> bool {
    username.trim().chars().count() >= 3
}

const USER_COLUMNS: &str =
    "id, username, password_hash, reset_token, reset_token_expiry, created_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// A duplicate username violates the unique constraint and surfaces as
    /// `sqlx::Error::Database`; other failures propagate unchanged.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, reset_token, reset_token_expiry, created_at
            "#,
        )
        .bind(data.username)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username (case-sensitive)
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Replaces a user's password hash
    ///
    /// Returns `false` if the user no longer exists.
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        new_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(new_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Issues a password-reset token for a user
    ///
    /// Generates a fresh token, stores it with its expiry, and returns it.
    /// A previously issued token is overwritten.
    pub async fn issue_reset_token(
        pool: &PgPool,
        id: Uuid,
        valid_for: Duration,
    ) -> Result<String, sqlx::Error> {
        let token = Uuid::new_v4().to_string();
        let expiry = Utc::now() + valid_for;

        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expiry = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&token)
        .bind(expiry)
        .execute(pool)
        .await?;

        Ok(token)
    }

    /// Redeems a reset token, setting a new password hash
    ///
    /// The lookup, expiry check, password write, and token clearing happen in
    /// one conditional UPDATE, so a token can be redeemed at most once.
    /// Returns `false` for an unknown or expired token.
    pub async fn redeem_reset_token(
        pool: &PgPool,
        token: &str,
        new_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expiry = NULL
            WHERE reset_token = $1 AND reset_token_expiry > NOW()
            "#,
        )
        .bind(token)
        .bind(new_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_accepts_normal_names() {
        assert!(validate_username("bob"));
        assert!(validate_username("alice"));
        assert!(validate_username("  alice  "));
    }

    #[test]
    fn test_validate_username_rejects_short_names() {
        assert!(!validate_username(""));
        assert!(!validate_username("ab"));
        assert!(!validate_username("  ab  "));
        assert!(!validate_username("   "));
    }

    #[test]
    fn test_validate_username_counts_characters_not_bytes() {
        // Three multibyte characters are still three characters
        assert!(validate_username("日本語"));
    }

    #[test]
    fn test_create_user_struct() {
        let data = CreateUser {
            username: "alice".to_string(),
            password_hash: "$argon2id$...".to_string(),
        };

        assert_eq!(data.username, "alice");
        assert!(data.password_hash.starts_with("$argon2id$"));
    }
}
