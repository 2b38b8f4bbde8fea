//! # scribe-core
//!
//! Core types, traits, and abstractions for the Scribe AI generation gateway.
//!
//! This crate provides the error taxonomy, the durable-store and upstream
//! backend traits, cache-key fingerprinting, and the shared default constants
//! that the other scribe crates depend on.

pub mod defaults;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use fingerprint::cache_fingerprint;
pub use models::*;
pub use traits::*;
