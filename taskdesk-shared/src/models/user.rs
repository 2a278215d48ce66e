/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(320) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
///     avatar BYTEA,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The avatar blob is deliberately not part of [`User`]; it is read and written
/// through [`User::find_avatar`], [`User::set_avatar`] and [`User::clear_avatar`]
/// so that authenticating a request never drags image bytes along.
///
/// Deleting a user cascades to their session tokens and tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, age, created_at, updated_at";

/// User model representing a user account
///
/// Serializing a `User` never emits the password hash, so the struct can be
/// returned from handlers as-is.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, stored trimmed and lower-cased
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Age in years, never negative
    pub age: i32,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address (normalized before insert)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Age in years
    pub age: i32,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,

    /// New email address (normalized before update)
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New age
    pub age: Option<i32>,
}

impl UpdateUser {
    /// Whether the update carries no field changes at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.age.is_none()
    }
}

/// Normalizes an email address for storage and lookup
///
/// ```
/// use taskdesk_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("  Jess@Example.COM "), "jess@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user in the database
    ///
    /// Accepts a pool or an open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (`users_email_key`
    /// constraint) or the database connection fails.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, age)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.name.trim())
        .bind(normalize_email(&data.email))
        .bind(data.password_hash)
        .bind(data.age)
        .fetch_one(executor)
        .await?;

        tracing::debug!(user_id = %user.id, "User created");

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// The address is normalized first, so lookup is case-insensitive.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Finds the user owning an active session token
    ///
    /// Returns `None` unless `user_id` holds exactly this `token` in its
    /// session list. A token that was logged out, or that belongs to a
    /// different user, never resolves.
    pub async fn find_by_session(
        pool: &PgPool,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.age, u.created_at, u.updated_at
            FROM users u
            JOIN user_tokens t ON t.user_id = u.id
            WHERE u.id = $1 AND t.token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written; `updated_at` is always
    /// bumped. Returns `None` if the user doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name.trim().to_string());
        }
        if let Some(email) = data.email {
            query.push(", email = ").push_bind(normalize_email(&email));
        }
        if let Some(password_hash) = data.password_hash {
            query.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(age) = data.age {
            query.push(", age = ").push_bind(age);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" RETURNING ").push(USER_COLUMNS);

        query.build_query_as::<User>().fetch_optional(pool).await
    }

    /// Deletes a user by ID, returning the deleted record
    ///
    /// Session tokens and tasks go with it (`ON DELETE CASCADE`).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        if let Some(ref user) = user {
            tracing::debug!(user_id = %user.id, "User deleted");
        }

        Ok(user)
    }

    /// Reads the stored avatar (PNG bytes)
    ///
    /// Returns `None` both when the user doesn't exist and when the user has
    /// no avatar.
    pub async fn find_avatar(pool: &PgPool, id: Uuid) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT avatar FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(row.and_then(|(avatar,)| avatar))
    }

    /// Stores an already-normalized avatar
    ///
    /// Returns false if the user doesn't exist.
    pub async fn set_avatar(pool: &PgPool, id: Uuid, png: &[u8]) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(png)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears the stored avatar
    ///
    /// Returns false if the user doesn't exist.
    pub async fn clear_avatar(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET avatar = NULL, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
