//! Error types for the Scribe gateway.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias using the gateway's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gateway operations.
///
/// The upstream variants distinguish transient failures (retried internally
/// by the dispatcher) from permanent ones (surfaced immediately). Storage
/// failures are classified so the caller can tell a bad reference from a
/// slow backend.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication failed or no credentials supplied
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Daily generation quota exhausted; not retryable until reset
    #[error("Daily generation limit of {limit} reached")]
    QuotaExceeded {
        /// Resolved daily limit for this caller.
        limit: i64,
        /// Remaining generations (zero on this path).
        remaining: i64,
        /// Next UTC midnight, when the counter resets.
        reset_at: DateTime<Utc>,
    },

    /// Inline payload exceeds the size threshold; never sent upstream
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Upstream signalled "too many requests" (transient, retried)
    #[error("Upstream rate limited: {0}")]
    UpstreamRateLimited(String),

    /// Transport-level failure reaching the upstream (transient, retried)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Transient upstream failures persisted past the retry budget
    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    /// Permanent upstream failure (bad request, auth); never retried
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Referenced object does not exist in storage
    #[error("Storage object not found: {0}")]
    StorageNotFound(String),

    /// Storage refused access to the referenced object
    #[error("Storage permission denied: {0}")]
    StoragePermissionDenied(String),

    /// Storage read exceeded its dedicated timeout
    #[error("Storage read timed out: {0}")]
    StorageTimeout(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the dispatcher may retry the operation that produced this error.
    ///
    /// Only an upstream "too many requests" signal and transport-level
    /// failures qualify; every other error propagates immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::UpstreamRateLimited(_) | Error::UpstreamUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::UpstreamUnavailable(e.to_string())
        } else {
            Error::Upstream(e.to_string())
        }
    }
}
