//! # scribe-db
//!
//! PostgreSQL storage layer for the Scribe AI generation gateway.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for the gateway's durable stores: usage
//!   counters, limit overrides, the content-addressed response cache, and
//!   the append-only audit log
//! - A filesystem-backed object store for previously uploaded audio
//!
//! ## Example
//!
//! ```rust,ignore
//! use scribe_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/scribe").await?;
//!     let today = chrono::Utc::now().date_naive();
//!     let record = db.usage.increment(user_id, today, 128).await?;
//!     println!("generations today: {}", record.generation_count);
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod cache;
pub mod limits;
pub mod object_store;
pub mod pool;
pub mod usage;

// Re-export core types
pub use scribe_core::*;

// Re-export repository implementations
pub use audit::PgAuditSink;
pub use cache::PgCacheRepository;
pub use limits::PgLimitRepository;
pub use object_store::FilesystemStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use usage::PgUsageRepository;

/// Combined database context with all gateway repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Per-user, per-day usage counters.
    pub usage: PgUsageRepository,
    /// Per-account daily limit overrides (read-only for the gateway).
    pub limits: PgLimitRepository,
    /// Content-addressed chat response cache.
    pub cache: PgCacheRepository,
    /// Append-only audit log.
    pub audit: PgAuditSink,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            usage: PgUsageRepository::new(pool.clone()),
            limits: PgLimitRepository::new(pool.clone()),
            cache: PgCacheRepository::new(pool.clone()),
            audit: PgAuditSink::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
