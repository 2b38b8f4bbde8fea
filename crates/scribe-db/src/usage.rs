//! Usage store: per-user, per-day generation counters.
//!
//! One row per (user_id, usage_date). Rows are created lazily with zero
//! counts on the first request of a UTC day and are never deleted by the
//! gateway. The increment is a single atomic statement at the storage layer;
//! two requests from the same user racing on the same daily row must never
//! lose an update.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use scribe_core::{Result, UsageRecord, UsageRepository};

/// PostgreSQL implementation of the usage store.
pub struct PgUsageRepository {
    pool: Pool<Postgres>,
}

impl PgUsageRepository {
    /// Create a new PgUsageRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for PgUsageRepository {
    async fn get(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<UsageRecord>> {
        let row = sqlx::query(
            r#"
            SELECT generation_count, token_count
            FROM generation_usage
            WHERE user_id = $1 AND usage_date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UsageRecord {
            user_id,
            usage_date: date,
            generation_count: r.get("generation_count"),
            token_count: r.get("token_count"),
        }))
    }

    async fn ensure_row(&self, user_id: Uuid, date: NaiveDate) -> Result<()> {
        // Idempotent: a concurrent creation of the same row is a no-op, not
        // an error, and never resets existing counts.
        let result = sqlx::query(
            r#"
            INSERT INTO generation_usage (user_id, usage_date, generation_count, token_count)
            VALUES ($1, $2, 0, 0)
            ON CONFLICT (user_id, usage_date) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(
                subsystem = "db",
                component = "usage",
                op = "ensure_row",
                user_id = %user_id,
                %date,
                "Created zero usage row"
            );
        }
        Ok(())
    }

    async fn increment(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        tokens_delta: i64,
    ) -> Result<UsageRecord> {
        // Single atomic read-modify-write. The upsert form also covers the
        // exempt-turned-standard edge where no zero row was created at
        // admission.
        let row = sqlx::query(
            r#"
            INSERT INTO generation_usage (user_id, usage_date, generation_count, token_count)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (user_id, usage_date) DO UPDATE SET
                generation_count = generation_usage.generation_count + 1,
                token_count = generation_usage.token_count + EXCLUDED.token_count,
                updated_at_utc = now()
            RETURNING generation_count, token_count
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(tokens_delta)
        .fetch_one(&self.pool)
        .await?;

        let record = UsageRecord {
            user_id,
            usage_date: date,
            generation_count: row.get("generation_count"),
            token_count: row.get("token_count"),
        };

        debug!(
            subsystem = "db",
            component = "usage",
            op = "increment",
            user_id = %user_id,
            generation_count = record.generation_count,
            token_count = record.token_count,
            "Usage incremented"
        );
        Ok(record)
    }
}
