//! End-to-end HTTP tests: the router served on an ephemeral port, hit with a
//! real client. Durable stores are in-memory; the upstream is scripted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use scribe_core::{
    AuditEvent, AuditSink, CachedResponse, LimitRepository, ResponseCacheRepository, Result,
    UsageRecord, UsageRepository,
};
use scribe_gateway::audit::AuditRecorder;
use scribe_gateway::identity::TokenEntry;
use scribe_gateway::{router, AppState, LimitResolver, Orchestrator, StaticTokenProvider};
use scribe_upstream::mock::{MockChatBackend, MockObjectStore, MockTranscriptionBackend};
use scribe_upstream::{RetryPolicy, UpstreamDispatcher};

const ALICE: Uuid = Uuid::from_u128(0xa11ce);

#[derive(Default)]
struct MemUsage(Mutex<HashMap<(Uuid, NaiveDate), (i64, i64)>>);

#[async_trait]
impl UsageRepository for MemUsage {
    async fn get(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<UsageRecord>> {
        Ok(self.0.lock().unwrap().get(&(user_id, date)).map(
            |&(generation_count, token_count)| UsageRecord {
                user_id,
                usage_date: date,
                generation_count,
                token_count,
            },
        ))
    }

    async fn ensure_row(&self, user_id: Uuid, date: NaiveDate) -> Result<()> {
        self.0.lock().unwrap().entry((user_id, date)).or_insert((0, 0));
        Ok(())
    }

    async fn increment(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        tokens_delta: i64,
    ) -> Result<UsageRecord> {
        let mut rows = self.0.lock().unwrap();
        let entry = rows.entry((user_id, date)).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += tokens_delta;
        Ok(UsageRecord {
            user_id,
            usage_date: date,
            generation_count: entry.0,
            token_count: entry.1,
        })
    }
}

struct FixedLimit(Option<i64>);

#[async_trait]
impl LimitRepository for FixedLimit {
    async fn get_override(&self, _user_id: Uuid) -> Result<Option<i64>> {
        Ok(self.0)
    }
}

struct NoCache;

#[async_trait]
impl ResponseCacheRepository for NoCache {
    async fn lookup(&self, _user_id: Uuid, _cache_key: &str) -> Result<Option<CachedResponse>> {
        Ok(None)
    }

    async fn store(
        &self,
        _user_id: Uuid,
        _cache_key: &str,
        _response: &CachedResponse,
        _ttl: Duration,
    ) -> Result<()> {
        Ok(())
    }
}

struct NullAudit;

#[async_trait]
impl AuditSink for NullAudit {
    async fn append(&self, _event: &AuditEvent) -> Result<()> {
        Ok(())
    }
}

/// Serve the gateway on an ephemeral port; returns its base URL.
async fn serve(chat: MockChatBackend, limit_override: Option<i64>) -> String {
    let dispatcher = UpstreamDispatcher::new(
        Arc::new(chat),
        Arc::new(MockTranscriptionBackend::new("unused")),
        Arc::new(MockObjectStore::new()),
    )
    .with_retry(RetryPolicy::none());

    let identity = StaticTokenProvider::new(vec![TokenEntry {
        token: "tok-alice".to_string(),
        user_id: ALICE,
        email: "alice@example.com".to_string(),
        exempt: false,
    }]);

    let orchestrator = Orchestrator::new(
        Arc::new(identity),
        Arc::new(MemUsage::default()),
        LimitResolver::new(Arc::new(FixedLimit(limit_override))),
        Arc::new(NoCache),
        Arc::new(dispatcher),
        AuditRecorder::new(Arc::new(NullAudit)),
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        chat_model: "gpt-4o-mini".to_string(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn chat_body() -> serde_json::Value {
    serde_json::json!({
        "messages": [{"role": "user", "content": "Summarize my notes"}]
    })
}

#[tokio::test]
async fn test_generate_requires_a_bearer_token() {
    let base = serve(MockChatBackend::new("unused"), None).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/generate"))
        .json(&chat_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_generate_chat_returns_content() {
    let base = serve(MockChatBackend::new("A tidy summary."), None).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/generate"))
        .bearer_auth("tok-alice")
        .json(&chat_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["content"], "A tidy summary.");
}

#[tokio::test]
async fn test_quota_exhaustion_maps_to_429_with_structured_body() {
    let base = serve(MockChatBackend::new("once"), Some(1)).await;
    let client = reqwest::Client::new();

    let first = client
        .post(format!("{base}/api/v1/generate"))
        .bearer_auth("tok-alice")
        .json(&chat_body())
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = client
        .post(format!("{base}/api/v1/generate"))
        .bearer_auth("tok-alice")
        .json(&chat_body())
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 429);

    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["code"], "quota_exceeded");
    assert_eq!(body["limit"], 1);
    assert_eq!(body["remaining"], 0);
    assert!(body["resetAt"].as_str().unwrap().contains("T00:00:00"));
}

#[tokio::test]
async fn test_empty_messages_map_to_400() {
    let base = serve(MockChatBackend::new("unused"), None).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/generate"))
        .bearer_auth("tok-alice")
        .json(&serde_json::json!({ "messages": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_permanent_upstream_failure_maps_to_502() {
    let base = serve(
        MockChatBackend::new("unused").with_permanent_failure(),
        None,
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/generate"))
        .bearer_auth("tok-alice")
        .json(&chat_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn test_health_endpoint() {
    let base = serve(MockChatBackend::new("unused"), None).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());
}
