/// Session token model
///
/// Each row is one active login. A user may hold many at once (one per
/// device); logging out removes exactly one, logging out everywhere removes
/// all of them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token TEXT NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// An active session token
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionToken {
    /// Row ID
    pub id: Uuid,

    /// Owner of the session
    pub user_id: Uuid,

    /// The signed token string, exactly as handed to the client
    pub token: String,

    /// When the session was opened
    pub created_at: DateTime<Utc>,
}

impl SessionToken {
    /// Appends a token to the user's session list
    ///
    /// Accepts a pool or an open transaction.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        token: &str,
    ) -> Result<Self, sqlx::Error> {
        let session = sqlx::query_as::<_, SessionToken>(
            r#"
            INSERT INTO user_tokens (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(executor)
        .await?;

        Ok(session)
    }

    /// Removes exactly one token from the user's session list
    ///
    /// Returns false if the user held no such token.
    pub async fn revoke(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears the user's session list, returning how many sessions were closed
    pub async fn revoke_all(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
