//! Trait seams between the orchestrator and its collaborators.
//!
//! Postgres implementations live in `scribe-db`, upstream HTTP backends in
//! `scribe-upstream`; tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AuditEvent, CachedResponse, ChatMessage, ChatOutcome, Identity, Transcript, UsageRecord,
};

/// Durable per-user, per-day usage counters.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Fetch the usage row for (user, date), if one exists.
    async fn get(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<UsageRecord>>;

    /// Create a zero row for (user, date) if absent. Idempotent: a
    /// duplicate-key creation attempt is success, not an error.
    async fn ensure_row(&self, user_id: Uuid, date: NaiveDate) -> Result<()>;

    /// Atomically add one generation and `tokens_delta` tokens, returning
    /// the new counters. Must be a single store-level read-modify-write so
    /// concurrent increments from the same user never lose updates.
    async fn increment(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        tokens_delta: i64,
    ) -> Result<UsageRecord>;
}

/// Read-only access to per-account daily limit overrides.
#[async_trait]
pub trait LimitRepository: Send + Sync {
    /// The raw configured override for this user, if any. Validation
    /// (non-positive values fall back to the default) is the resolver's job.
    async fn get_override(&self, user_id: Uuid) -> Result<Option<i64>>;
}

/// Content-addressed per-user cache of chat responses.
#[async_trait]
pub trait ResponseCacheRepository: Send + Sync {
    /// Fetch a non-expired entry for (user, key). An expired match is a
    /// miss; expired rows are not deleted here (lazy expiry).
    async fn lookup(&self, user_id: Uuid, cache_key: &str) -> Result<Option<CachedResponse>>;

    /// Upsert the entry for `cache_key` with `expires_at = now + ttl`.
    /// Last write wins if the same key recurs before expiry.
    async fn store(
        &self,
        user_id: Uuid,
        cache_key: &str,
        response: &CachedResponse,
        ttl: Duration,
    ) -> Result<()>;
}

/// Append-only audit log sink.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one immutable event row.
    async fn append(&self, event: &AuditEvent) -> Result<()>;
}

/// Binary object storage for previously uploaded audio.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the object at `path`. Errors distinguish a missing object
    /// (`StorageNotFound`) from a permission failure
    /// (`StoragePermissionDenied`).
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// External identity check. Failure yields `Unauthorized`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the bearer token to an authenticated identity.
    async fn authenticate(&self, bearer_token: Option<&str>) -> Result<Identity>;
}

/// Upstream chat completion backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Perform one chat completion call. No retry here; the dispatcher owns
    /// the retry budget.
    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> Result<ChatOutcome>;
}

/// Upstream audio transcription backend.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe the given audio bytes. No retry here; the dispatcher owns
    /// the retry budget.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<Transcript>;
}
