//! Effective daily limit resolution.
//!
//! Precedence: exempt account class, then a valid per-account override, then
//! the system default. An invalid (non-positive) override is logged and
//! ignored rather than rejected, so a bad config row degrades to the default
//! instead of blocking the user.

use std::sync::Arc;

use tracing::warn;

use scribe_core::{defaults, AccountClass, Identity, Limit, LimitRepository, Result};

/// Resolves the effective daily generation limit for a caller.
#[derive(Clone)]
pub struct LimitResolver {
    limits: Arc<dyn LimitRepository>,
    default_limit: i64,
}

impl LimitResolver {
    /// Resolver using the system default limit.
    pub fn new(limits: Arc<dyn LimitRepository>) -> Self {
        Self {
            limits,
            default_limit: defaults::DEFAULT_DAILY_LIMIT,
        }
    }

    /// Override the fallback limit (for tests and tuning).
    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Resolve the caller's effective limit.
    ///
    /// Exempt accounts never touch the limit store. A store failure for a
    /// standard account propagates (fail closed) rather than granting the
    /// default.
    pub async fn resolve(&self, identity: &Identity) -> Result<Limit> {
        if identity.class == AccountClass::Exempt {
            return Ok(Limit::Unlimited);
        }
        let raw = self.limits.get_override(identity.user_id).await?;
        Ok(Limit::Bounded(effective_limit(
            raw,
            self.default_limit,
            identity,
        )))
    }
}

/// Pick the bounded limit from a raw override value.
fn effective_limit(raw: Option<i64>, default_limit: i64, identity: &Identity) -> i64 {
    match raw {
        Some(v) if v >= 1 => v,
        Some(v) => {
            warn!(
                subsystem = "gateway",
                component = "quota",
                user_id = %identity.user_id,
                configured = v,
                daily_limit = default_limit,
                "Ignoring non-positive limit override, using default"
            );
            default_limit
        }
        None => default_limit,
    }
}
