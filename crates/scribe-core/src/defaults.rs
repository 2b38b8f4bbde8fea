//! Centralized default constants for the Scribe gateway.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// QUOTA
// =============================================================================

/// System default daily generation limit per user.
///
/// Applies when no per-account override row exists, or when an override row
/// carries an invalid (non-positive) value.
pub const DEFAULT_DAILY_LIMIT: i64 = 50;

// =============================================================================
// UPSTREAM MODEL API
// =============================================================================

/// Default OpenAI-compatible API endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1";

/// Default (economical) chat completion model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default transcription model.
pub const DEFAULT_TRANSCRIBE_MODEL: &str = "whisper-1";

/// Default sampling temperature for chat completion.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default chat completion request timeout in seconds.
pub const CHAT_TIMEOUT_SECS: u64 = 120;

/// Default transcription request timeout in seconds (long audio).
pub const TRANSCRIBE_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// RETRY
// =============================================================================

/// Maximum upstream attempts (initial call plus retries).
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Base backoff delay in milliseconds; doubles each attempt.
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Backoff delay ceiling in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;

// =============================================================================
// TRANSCRIPTION PAYLOADS
// =============================================================================

/// Maximum inline audio payload in bytes (25 MB, the Whisper upload cap).
/// Checked before any upload or transcode is attempted.
pub const MAX_INLINE_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Default MIME type for audio payloads when the client omits one.
pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// Dedicated timeout for materializing a storage reference, in seconds.
/// Distinct from the transcription call's own timeout.
pub const STORAGE_READ_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// RESPONSE CACHE
// =============================================================================

/// Cache entry retention window in seconds (7 days).
pub const CACHE_TTL_SECS: i64 = 7 * 24 * 3600;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP bind address.
pub const BIND_ADDR: &str = "0.0.0.0:8080";

/// Maximum request body size in bytes (32 MB: inline audio plus base64
/// overhead and JSON framing).
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

// =============================================================================
// ENVIRONMENT VARIABLE NAMES
// =============================================================================

/// PostgreSQL connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Upstream model API base URL.
pub const ENV_UPSTREAM_BASE_URL: &str = "SCRIBE_UPSTREAM_BASE_URL";

/// Upstream model API bearer token.
pub const ENV_UPSTREAM_API_KEY: &str = "SCRIBE_UPSTREAM_API_KEY";

/// Chat model identifier override.
pub const ENV_CHAT_MODEL: &str = "SCRIBE_CHAT_MODEL";

/// Transcription model identifier override.
pub const ENV_TRANSCRIBE_MODEL: &str = "SCRIBE_TRANSCRIBE_MODEL";

/// HTTP bind address override.
pub const ENV_BIND_ADDR: &str = "SCRIBE_BIND_ADDR";

/// Base directory for the filesystem object store (uploaded audio).
pub const ENV_AUDIO_STORE_PATH: &str = "SCRIBE_AUDIO_STORE_PATH";

/// JSON array of API tokens for the static identity provider.
pub const ENV_API_TOKENS: &str = "SCRIBE_API_TOKENS";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit_is_positive() {
        assert!(DEFAULT_DAILY_LIMIT >= 1);
    }

    #[test]
    fn test_retry_budget_allows_two_failures() {
        // Two rate-limit signals followed by a success must fit the budget.
        assert!(RETRY_MAX_ATTEMPTS >= 3);
        assert!(RETRY_BASE_DELAY_MS <= RETRY_MAX_DELAY_MS);
    }

    #[test]
    fn test_body_cap_fits_inline_audio() {
        // Base64 inflates by 4/3; the body cap must still admit a maximal
        // inline payload.
        assert!(MAX_BODY_BYTES > MAX_INLINE_AUDIO_BYTES * 4 / 3);
    }
}
