//! Generation request orchestration.
//!
//! Sequences one request through authentication, quota admission, the cache
//! probe, upstream dispatch, and post-success accounting. The rules that
//! shape the sequencing:
//!
//! - A failed dispatch never consumes quota; the increment happens only
//!   after a successful result is in hand.
//! - A cache hit consumes one generation unit but zero tokens.
//! - An increment failure after success is logged at elevated severity and
//!   the caller still receives their result.
//! - Exempt accounts skip the usage store entirely, in both directions.
//!
//! The commit phase (dispatch through accounting) runs on a spawned task so
//! a client disconnect cannot cancel it mid-flight and leave a generation
//! unaccounted for.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use scribe_core::{
    cache_fingerprint, defaults, next_utc_midnight, AuditEventType, CachedResponse, Error,
    GenerationRequest, GenerationResponse, Identity, IdentityProvider, Limit,
    ResponseCacheRepository, Result, Severity, UsageRepository,
};
use scribe_upstream::UpstreamDispatcher;

use crate::audit::AuditRecorder;
use crate::quota::LimitResolver;

/// Orchestrates the full lifecycle of one generation request.
#[derive(Clone)]
pub struct Orchestrator {
    identity: Arc<dyn IdentityProvider>,
    usage: Arc<dyn UsageRepository>,
    limits: LimitResolver,
    cache: Arc<dyn ResponseCacheRepository>,
    dispatcher: Arc<UpstreamDispatcher>,
    audit: AuditRecorder,
    cache_ttl: Duration,
}

impl Orchestrator {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        usage: Arc<dyn UsageRepository>,
        limits: LimitResolver,
        cache: Arc<dyn ResponseCacheRepository>,
        dispatcher: Arc<UpstreamDispatcher>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            identity,
            usage,
            limits,
            cache,
            dispatcher,
            audit,
            cache_ttl: Duration::from_secs(defaults::CACHE_TTL_SECS as u64),
        }
    }

    /// Override the cache entry TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Handle one generation request end to end.
    pub async fn handle(
        &self,
        bearer_token: Option<&str>,
        request: GenerationRequest,
    ) -> Result<GenerationResponse> {
        let request_id = Uuid::now_v7();
        let request_type = request_type_str(&request);

        self.audit
            .record(
                AuditEventType::RequestReceived,
                None,
                Severity::Low,
                true,
                json!({ "request_id": request_id, "request_type": request_type }),
            )
            .await;

        let identity = match self.identity.authenticate(bearer_token).await {
            Ok(identity) => identity,
            Err(e) => {
                self.audit
                    .record(
                        AuditEventType::UnauthorizedAttempt,
                        None,
                        Severity::High,
                        false,
                        json!({
                            "request_id": request_id,
                            "request_type": request_type,
                            "error": e.to_string(),
                        }),
                    )
                    .await;
                return Err(e);
            }
        };

        let today = Utc::now().date_naive();
        let limit = match self.limits.resolve(&identity).await {
            Ok(limit) => limit,
            Err(e) => {
                self.record_error(request_id, Some(identity.user_id), request_type, &e)
                    .await;
                return Err(e);
            }
        };

        if let Limit::Bounded(limit) = limit {
            let count = match self.current_count(&identity, today).await {
                Ok(count) => count,
                Err(e) => {
                    self.record_error(request_id, Some(identity.user_id), request_type, &e)
                        .await;
                    return Err(e);
                }
            };
            if count >= limit {
                self.audit
                    .record(
                        AuditEventType::RateLimitExceeded,
                        Some(identity.user_id),
                        Severity::Medium,
                        false,
                        json!({
                            "request_id": request_id,
                            "request_type": request_type,
                            "limit": limit,
                            "generation_count": count,
                        }),
                    )
                    .await;
                return Err(Error::QuotaExceeded {
                    limit,
                    remaining: 0,
                    reset_at: next_utc_midnight(today),
                });
            }
            debug!(
                subsystem = "gateway",
                component = "orchestrator",
                request_id = %request_id,
                user_id = %identity.user_id,
                generation_count = count,
                daily_limit = limit,
                "Quota admission passed"
            );
        }

        let exempt = matches!(limit, Limit::Unlimited);

        // Run the commit phase on its own task: once the request is admitted,
        // a dropped client connection must not cancel the upstream call or
        // the accounting that follows it.
        let user_id = identity.user_id;
        let this = self.clone();
        let task = tokio::spawn(async move {
            this.execute(request_id, identity, request, exempt, today)
                .await
        });
        match task.await {
            Ok(result) => result,
            Err(e) => {
                let e = Error::Internal(format!("generation task failed: {e}"));
                self.record_error(request_id, Some(user_id), request_type, &e)
                    .await;
                Err(e)
            }
        }
    }

    /// Current-day generation count, creating the zero row on the first
    /// request of the day.
    async fn current_count(&self, identity: &Identity, today: NaiveDate) -> Result<i64> {
        match self.usage.get(identity.user_id, today).await? {
            Some(record) => Ok(record.generation_count),
            None => {
                self.usage.ensure_row(identity.user_id, today).await?;
                Ok(0)
            }
        }
    }

    /// Dispatch, account, cache, and audit one admitted request.
    async fn execute(
        &self,
        request_id: Uuid,
        identity: Identity,
        request: GenerationRequest,
        exempt: bool,
        today: NaiveDate,
    ) -> Result<GenerationResponse> {
        match request {
            GenerationRequest::Chat {
                messages,
                model,
                temperature,
                file_hash,
            } => {
                let prompt = match serde_json::to_string(&messages) {
                    Ok(prompt) => prompt,
                    Err(e) => {
                        let e = Error::from(e);
                        self.record_error(request_id, Some(identity.user_id), "chat", &e)
                            .await;
                        return Err(e);
                    }
                };
                let cache_key = file_hash
                    .as_deref()
                    .map(|content_id| cache_fingerprint(content_id, &prompt, &model));

                if let Some(key) = &cache_key {
                    match self.cache.lookup(identity.user_id, key).await {
                        Ok(Some(cached)) => {
                            info!(
                                subsystem = "gateway",
                                component = "orchestrator",
                                request_id = %request_id,
                                user_id = %identity.user_id,
                                cache_key = %key,
                                cache_hit = true,
                                "Serving chat response from cache"
                            );
                            if !exempt {
                                self.record_usage(request_id, &identity, today, 0).await;
                            }
                            self.audit
                                .record(
                                    AuditEventType::GenerationCompleted,
                                    Some(identity.user_id),
                                    Severity::Low,
                                    true,
                                    json!({
                                        "request_id": request_id,
                                        "request_type": "chat",
                                        "cache_hit": true,
                                    }),
                                )
                                .await;
                            return Ok(GenerationResponse::Chat {
                                content: cached.content,
                            });
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(
                                subsystem = "gateway",
                                component = "orchestrator",
                                request_id = %request_id,
                                cache_key = %key,
                                error = %e,
                                "Cache lookup failed; treating as a miss"
                            );
                        }
                    }
                }

                let outcome = match self
                    .dispatcher
                    .chat_complete(&messages, &model, temperature)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        self.record_failure(request_id, &identity, "chat", &e).await;
                        return Err(e);
                    }
                };

                if !exempt {
                    self.record_usage(request_id, &identity, today, outcome.usage.total_tokens)
                        .await;
                }

                if let Some(key) = &cache_key {
                    let cached = CachedResponse {
                        content: outcome.content.clone(),
                        usage: outcome.usage,
                    };
                    if let Err(e) = self
                        .cache
                        .store(identity.user_id, key, &cached, self.cache_ttl)
                        .await
                    {
                        warn!(
                            subsystem = "gateway",
                            component = "orchestrator",
                            request_id = %request_id,
                            cache_key = %key,
                            error = %e,
                            "Cache store failed; response still returned"
                        );
                    }
                }

                self.audit
                    .record(
                        AuditEventType::GenerationCompleted,
                        Some(identity.user_id),
                        Severity::Low,
                        true,
                        json!({
                            "request_id": request_id,
                            "request_type": "chat",
                            "cache_hit": false,
                            "total_tokens": outcome.usage.total_tokens,
                        }),
                    )
                    .await;

                Ok(GenerationResponse::Chat {
                    content: outcome.content,
                })
            }

            GenerationRequest::Transcription { source, mime_type } => {
                let transcript = match self.dispatcher.transcribe(&source, &mime_type).await {
                    Ok(transcript) => transcript,
                    Err(e) => {
                        self.record_failure(request_id, &identity, "transcription", &e)
                            .await;
                        return Err(e);
                    }
                };

                // Transcription reports no token usage.
                if !exempt {
                    self.record_usage(request_id, &identity, today, 0).await;
                }

                self.audit
                    .record(
                        AuditEventType::GenerationCompleted,
                        Some(identity.user_id),
                        Severity::Low,
                        true,
                        json!({
                            "request_id": request_id,
                            "request_type": "transcription",
                        }),
                    )
                    .await;

                Ok(GenerationResponse::Transcription {
                    text: transcript.text,
                })
            }
        }
    }

    /// Increment the caller's counters after a successful generation.
    ///
    /// A failure here loses nothing for the caller; the undercount is logged
    /// at ERROR for the operator.
    async fn record_usage(
        &self,
        request_id: Uuid,
        identity: &Identity,
        today: NaiveDate,
        tokens_delta: i64,
    ) {
        match self
            .usage
            .increment(identity.user_id, today, tokens_delta)
            .await
        {
            Ok(record) => {
                info!(
                    subsystem = "gateway",
                    component = "orchestrator",
                    request_id = %request_id,
                    user_id = %identity.user_id,
                    generation_count = record.generation_count,
                    token_count = record.token_count,
                    "Usage incremented"
                );
            }
            Err(e) => {
                error!(
                    subsystem = "gateway",
                    component = "orchestrator",
                    request_id = %request_id,
                    user_id = %identity.user_id,
                    error = %e,
                    "Usage increment failed after a successful generation; \
                     the day's counters undercount"
                );
            }
        }
    }

    async fn record_failure(
        &self,
        request_id: Uuid,
        identity: &Identity,
        request_type: &str,
        e: &Error,
    ) {
        self.audit
            .record(
                AuditEventType::GenerationFailed,
                Some(identity.user_id),
                Severity::High,
                false,
                json!({
                    "request_id": request_id,
                    "request_type": request_type,
                    "error": e.to_string(),
                }),
            )
            .await;
    }

    /// Terminal audit event for failures outside dispatch: a store error on
    /// the admission path, or an internal fault. Every attempt leaves a
    /// trace, whatever its outcome.
    async fn record_error(
        &self,
        request_id: Uuid,
        user_id: Option<Uuid>,
        request_type: &str,
        e: &Error,
    ) {
        self.audit
            .record(
                AuditEventType::Error,
                user_id,
                Severity::High,
                false,
                json!({
                    "request_id": request_id,
                    "request_type": request_type,
                    "error": e.to_string(),
                }),
            )
            .await;
    }
}

fn request_type_str(request: &GenerationRequest) -> &'static str {
    match request {
        GenerationRequest::Chat { .. } => "chat",
        GenerationRequest::Transcription { .. } => "transcription",
    }
}
