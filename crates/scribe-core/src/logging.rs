//! Structured logging schema and field name constants for the Scribe gateway.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation tools can query by standardized names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across the request lifecycle.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "gateway", "db", "upstream"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "orchestrator", "usage", "cache", "audit", "chat", "transcribe"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "generate", "increment", "lookup", "chat_complete"
pub const OPERATION: &str = "op";

/// Authenticated user UUID.
pub const USER_ID: &str = "user_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Tokens consumed by a generation.
pub const TOKEN_COUNT: &str = "token_count";

/// Current daily generation count after an increment.
pub const GENERATION_COUNT: &str = "generation_count";

/// Resolved daily limit for the caller.
pub const DAILY_LIMIT: &str = "daily_limit";

/// Byte length of an audio payload.
pub const AUDIO_BYTES: &str = "audio_bytes";

// ─── Upstream fields ───────────────────────────────────────────────────────

/// Model name used for the upstream call.
pub const MODEL: &str = "model";

/// Attempt number within the retry budget (1-based).
pub const ATTEMPT: &str = "attempt";

/// Backoff delay before the next attempt, in milliseconds.
pub const BACKOFF_MS: &str = "backoff_ms";

// ─── Cache fields ──────────────────────────────────────────────────────────

/// Hex cache key (fingerprint) being looked up or stored.
pub const CACHE_KEY: &str = "cache_key";

/// Whether a cache lookup was served from the cache.
pub const CACHE_HIT: &str = "cache_hit";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
