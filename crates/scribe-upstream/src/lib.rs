//! # scribe-upstream
//!
//! Upstream model API client layer for the Scribe AI generation gateway.
//!
//! This crate provides:
//! - Process-wide immutable upstream configuration resolved once at startup
//! - OpenAI-compatible chat completion backend
//! - Whisper-compatible transcription backend
//! - Bounded exponential-backoff retry for transient upstream failures
//! - The `UpstreamDispatcher`, which sequences payload size checks, storage
//!   materialization, and retries for both operation types
//!
//! The dispatcher's only side effect is the outbound network call; usage
//! accounting and caching are sequenced by the gateway orchestrator.
//!
//! # Feature Flags
//!
//! - `mock`: scripted mock backends for orchestrator tests

pub mod chat;
pub mod config;
pub mod dispatcher;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod retry;
pub mod transcription;

pub use chat::ChatCompletionBackend;
pub use config::UpstreamConfig;
pub use dispatcher::UpstreamDispatcher;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use transcription::WhisperBackend;
