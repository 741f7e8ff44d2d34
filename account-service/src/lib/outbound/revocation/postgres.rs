use std::sync::Arc;

use async_trait::async_trait;
use auth::Clock;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::revocation::errors::RevocationError;
use crate::domain::revocation::ports::RevocationRegistry;

/// Revocation registry stored in the `revoked_tokens` table, shared by
/// every instance of the service.
pub struct PostgresRevocationRegistry {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresRevocationRegistry {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl RevocationRegistry for PostgresRevocationRegistry {
    async fn revoke(&self, key: &str, expires_at: DateTime<Utc>) -> Result<bool, RevocationError> {
        let now = self.clock.now();

        // An expired row is logically absent; clear it so the insert below
        // decides who revoked the key.
        sqlx::query("DELETE FROM revoked_tokens WHERE token_id = $1 AND expires_at < $2")
            .bind(key)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| RevocationError::Storage(e.to_string()))?;

        // Concurrent inserts of the same key wait on each other; exactly one
        // gets the row back.
        let inserted: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO revoked_tokens (token_id, expires_at, revoked_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (token_id) DO NOTHING
            RETURNING token_id
            "#,
        )
        .bind(key)
        .bind(expires_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RevocationError::Storage(e.to_string()))?;

        if inserted.is_some() {
            return Ok(true);
        }

        sqlx::query(
            "UPDATE revoked_tokens SET expires_at = GREATEST(expires_at, $2) WHERE token_id = $1",
        )
        .bind(key)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RevocationError::Storage(e.to_string()))?;

        Ok(false)
    }

    async fn is_revoked(&self, key: &str) -> Result<bool, RevocationError> {
        let now = self.clock.now();

        let expires_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT expires_at FROM revoked_tokens WHERE token_id = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RevocationError::Storage(e.to_string()))?;

        match expires_at {
            None => Ok(false),
            Some(expires_at) if now <= expires_at => Ok(true),
            Some(_) => {
                sqlx::query("DELETE FROM revoked_tokens WHERE token_id = $1 AND expires_at < $2")
                    .bind(key)
                    .bind(now)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| RevocationError::Storage(e.to_string()))?;

                tracing::debug!(token_id = %key, "Purged expired revocation entry");
                Ok(false)
            }
        }
    }

    async fn purge_expired(&self) -> Result<u64, RevocationError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < $1")
            .bind(self.clock.now())
            .execute(&self.pool)
            .await
            .map_err(|e| RevocationError::Storage(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
