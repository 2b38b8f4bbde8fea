//! Core data model for the generation gateway.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller category with respect to quota accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    /// Subject to the daily generation limit.
    Standard,
    /// Bypasses quota accounting entirely (no row read, no increment).
    Exempt,
}

/// Authenticated caller identity, supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub class: AccountClass,
}

/// Effective daily quota for a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Exempt account class; usage accounting is skipped entirely.
    Unlimited,
    /// At most `n` generations per UTC day, n >= 1.
    Bounded(i64),
}

/// Per-user, per-day usage counters.
///
/// At most one row exists per (user_id, usage_date); created lazily with
/// zero counts on the first request of the day, mutated only by the usage
/// store's atomic increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: Uuid,
    pub usage_date: NaiveDate,
    pub generation_count: i64,
    pub token_count: i64,
}

/// One turn of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Token accounting reported by the upstream for one generation.
///
/// All fields default to zero: transcription reports no token usage, and
/// some OpenAI-compatible servers omit the usage block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: i64,
    #[serde(default)]
    pub completion_tokens: i64,
    #[serde(default)]
    pub total_tokens: i64,
}

/// Successful chat completion result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOutcome {
    pub content: String,
    pub usage: TokenUsage,
}

/// Successful transcription result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
}

/// Cached chat response payload, stored as JSONB alongside its token usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub content: String,
    pub usage: TokenUsage,
}

/// Where the transcription audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Raw bytes supplied inline with the request.
    Inline(Vec<u8>),
    /// Reference to previously uploaded audio in the object store.
    StorageRef(String),
}

/// Validated gateway request, dispatched once near the top of the
/// orchestrator. Each variant owns its own validation and response shape.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Chat {
        messages: Vec<ChatMessage>,
        model: String,
        temperature: f32,
        /// Caller-supplied content identifier; presence enables caching.
        file_hash: Option<String>,
    },
    Transcription {
        source: AudioSource,
        mime_type: String,
    },
}

/// Terminal success payload, one shape per request variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResponse {
    Chat { content: String },
    Transcription { text: String },
}

/// Audit event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    RequestReceived,
    GenerationCompleted,
    GenerationFailed,
    RateLimitExceeded,
    UnauthorizedAttempt,
    Error,
}

impl AuditEventType {
    /// Stable string form stored in the audit table.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::RequestReceived => "request_received",
            AuditEventType::GenerationCompleted => "generation_completed",
            AuditEventType::GenerationFailed => "generation_failed",
            AuditEventType::RateLimitExceeded => "rate_limit_exceeded",
            AuditEventType::UnauthorizedAttempt => "unauthorized_attempt",
            AuditEventType::Error => "error",
        }
    }
}

/// Audit event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Stable string form stored in the audit table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// One append-only audit row. `user_id` is None for unauthenticated callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    pub user_id: Option<Uuid>,
    pub severity: Severity,
    pub success: bool,
    pub detail: serde_json::Value,
}

/// Next UTC midnight after the given day; when the daily counter resets.
pub fn next_utc_midnight(day: NaiveDate) -> DateTime<Utc> {
    let next = day.succ_opt().unwrap_or(day);
    Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0).expect("midnight is valid"))
}
