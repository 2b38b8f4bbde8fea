//! Append-only audit log.
//!
//! Rows are immutable once written. The sink itself returns errors like any
//! repository; making writes best-effort (swallow-and-log) is the gateway's
//! `AuditRecorder` wrapper, so other consumers of this table can still
//! observe failures.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use scribe_core::{AuditEvent, AuditSink, Result};

/// PostgreSQL implementation of the audit sink.
pub struct PgAuditSink {
    pool: Pool<Postgres>,
}

impl PgAuditSink {
    /// Create a new PgAuditSink with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn append(&self, event: &AuditEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO gateway_audit_log (event_type, user_id, severity, success, detail)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.event_type.as_str())
        .bind(event.user_id)
        .bind(event.severity.as_str())
        .bind(event.success)
        .bind(&event.detail)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
