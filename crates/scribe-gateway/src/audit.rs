//! Best-effort audit recording.
//!
//! The audit trail must never decide a request's fate: a failed append is
//! logged at WARN and swallowed, and the request proceeds as if it had
//! succeeded.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use scribe_core::{AuditEvent, AuditEventType, AuditSink, Severity};

/// Wraps an [`AuditSink`] with the swallow-and-warn discipline.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Append one event, ignoring sink failures.
    pub async fn record(
        &self,
        event_type: AuditEventType,
        user_id: Option<Uuid>,
        severity: Severity,
        success: bool,
        detail: serde_json::Value,
    ) {
        let event = AuditEvent {
            event_type,
            user_id,
            severity,
            success,
            detail,
        };
        if let Err(e) = self.sink.append(&event).await {
            warn!(
                subsystem = "gateway",
                component = "audit",
                event_type = event.event_type.as_str(),
                error = %e,
                "Audit append failed; continuing"
            );
        }
    }
}
