//! Per-account daily limit overrides.
//!
//! Rows are created and updated by an external administrative action; the
//! gateway only reads them. The raw configured value is returned as-is —
//! validating it (non-positive values fall back to the system default) is
//! the limit resolver's responsibility.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use scribe_core::{LimitRepository, Result};

/// PostgreSQL implementation of the limit override store.
pub struct PgLimitRepository {
    pool: Pool<Postgres>,
}

impl PgLimitRepository {
    /// Create a new PgLimitRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LimitRepository for PgLimitRepository {
    async fn get_override(&self, user_id: Uuid) -> Result<Option<i64>> {
        let row = sqlx::query(
            r#"
            SELECT daily_limit
            FROM generation_limit_override
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| i64::from(r.get::<i32, _>("daily_limit"))))
    }
}
