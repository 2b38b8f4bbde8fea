//! Content-addressed chat response cache.
//!
//! Keyed by the hex SHA-256 fingerprint of (content identifier, serialized
//! prompt, model). Entries are owned by a single user and never shared
//! across users: lookups filter on both the key and the owning user_id, and
//! only on rows whose retention window has not passed. Expired rows are
//! treated as misses and left in place; cleanup is an external concern.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::{Pool, Postgres, Row};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use scribe_core::{CachedResponse, Error, ResponseCacheRepository, Result};

/// PostgreSQL implementation of the response cache.
pub struct PgCacheRepository {
    pool: Pool<Postgres>,
}

impl PgCacheRepository {
    /// Create a new PgCacheRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseCacheRepository for PgCacheRepository {
    async fn lookup(&self, user_id: Uuid, cache_key: &str) -> Result<Option<CachedResponse>> {
        let row = sqlx::query(
            r#"
            SELECT response
            FROM generation_cache
            WHERE cache_key = $1 AND user_id = $2 AND expires_at > now()
            "#,
        )
        .bind(cache_key)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let hit = row.is_some();
        debug!(
            subsystem = "db",
            component = "cache",
            op = "lookup",
            user_id = %user_id,
            cache_key,
            cache_hit = hit,
            "Cache lookup"
        );

        row.map(|r| {
            let value: serde_json::Value = r.get("response");
            serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn store(
        &self,
        user_id: Uuid,
        cache_key: &str,
        response: &CachedResponse,
        ttl: Duration,
    ) -> Result<()> {
        let expires_at = Utc::now()
            + ChronoDuration::from_std(ttl)
                .map_err(|e| Error::InvalidInput(format!("Cache TTL out of range: {}", e)))?;
        let payload = serde_json::to_value(response)?;

        // Last write wins on cache_key: a recurring key before expiry (same
        // user or not) supersedes the previous entry.
        sqlx::query(
            r#"
            INSERT INTO generation_cache (cache_key, user_id, response, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cache_key) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                response = EXCLUDED.response,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(cache_key)
        .bind(user_id)
        .bind(payload)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        debug!(
            subsystem = "db",
            component = "cache",
            op = "store",
            user_id = %user_id,
            cache_key,
            expires_at = %expires_at,
            "Cache entry stored"
        );
        Ok(())
    }
}
