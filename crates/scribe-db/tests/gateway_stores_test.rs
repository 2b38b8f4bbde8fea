//! Integration tests for the gateway's durable stores.
//!
//! These require a live PostgreSQL instance with the migrations applied:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/scribe_test cargo test -p scribe-db --test gateway_stores_test
//! ```
//!
//! Tests are skipped when DATABASE_URL is not set.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use scribe_core::{
    AuditEvent, AuditEventType, AuditSink, CachedResponse, LimitRepository,
    ResponseCacheRepository, Severity, TokenUsage, UsageRepository,
};
use scribe_db::Database;
use uuid::Uuid;

/// Connect to the test database, or skip the test when none is configured.
async fn test_db(test_name: &str) -> Option<Database> {
    dotenvy::dotenv().ok();
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            println!("skipping {} - DATABASE_URL not set", test_name);
            return None;
        }
    };
    Some(
        Database::connect(&url)
            .await
            .expect("failed to connect to test database"),
    )
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::test]
async fn test_ensure_row_is_idempotent() {
    let Some(db) = test_db("test_ensure_row_is_idempotent").await else {
        return;
    };
    let user = Uuid::new_v4();

    db.usage.ensure_row(user, today()).await.unwrap();
    let first = db.usage.increment(user, today(), 10).await.unwrap();

    // A second ensure_row must neither fail nor reset the counters.
    db.usage.ensure_row(user, today()).await.unwrap();
    let after = db.usage.get(user, today()).await.unwrap().unwrap();

    assert_eq!(after.generation_count, first.generation_count);
    assert_eq!(after.token_count, 10);
}

#[tokio::test]
async fn test_get_absent_row() {
    let Some(db) = test_db("test_get_absent_row").await else {
        return;
    };
    let user = Uuid::new_v4();

    assert!(db.usage.get(user, today()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_increments_lose_nothing() {
    let Some(db) = test_db("test_concurrent_increments_lose_nothing").await else {
        return;
    };
    let user = Uuid::new_v4();
    db.usage.ensure_row(user, today()).await.unwrap();

    // The primary concurrency hazard: parallel increments on one daily row.
    let mut handles = Vec::new();
    for _ in 0..16 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.usage.increment(user, today(), 5).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let record = db.usage.get(user, today()).await.unwrap().unwrap();
    assert_eq!(record.generation_count, 16);
    assert_eq!(record.token_count, 80);
}

#[tokio::test]
async fn test_increment_without_prior_row() {
    let Some(db) = test_db("test_increment_without_prior_row").await else {
        return;
    };
    let user = Uuid::new_v4();

    let record = db.usage.increment(user, today(), 42).await.unwrap();
    assert_eq!(record.generation_count, 1);
    assert_eq!(record.token_count, 42);
}

#[tokio::test]
async fn test_limit_override_absent() {
    let Some(db) = test_db("test_limit_override_absent").await else {
        return;
    };
    assert!(db.limits.get_override(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_round_trip_and_ownership() {
    let Some(db) = test_db("test_cache_round_trip_and_ownership").await else {
        return;
    };
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    let key = scribe_core::cache_fingerprint(&Uuid::new_v4().to_string(), "prompt", "model");
    let response = CachedResponse {
        content: "cached summary".to_string(),
        usage: TokenUsage {
            prompt_tokens: 5,
            completion_tokens: 7,
            total_tokens: 12,
        },
    };

    db.cache
        .store(owner, &key, &response, Duration::from_secs(3600))
        .await
        .unwrap();

    let hit = db.cache.lookup(owner, &key).await.unwrap().unwrap();
    assert_eq!(hit, response);

    // Cache is per-user: another user's lookup with the same key misses.
    assert!(db.cache.lookup(other, &key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_entry_is_a_miss() {
    let Some(db) = test_db("test_expired_entry_is_a_miss").await else {
        return;
    };
    let user = Uuid::new_v4();
    let key = scribe_core::cache_fingerprint(&Uuid::new_v4().to_string(), "prompt", "model");
    let response = CachedResponse {
        content: "stale".to_string(),
        usage: TokenUsage::default(),
    };

    db.cache
        .store(user, &key, &response, Duration::from_millis(50))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(db.cache.lookup(user, &key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_upsert_last_write_wins() {
    let Some(db) = test_db("test_cache_upsert_last_write_wins").await else {
        return;
    };
    let user = Uuid::new_v4();
    let key = scribe_core::cache_fingerprint(&Uuid::new_v4().to_string(), "prompt", "model");

    let first = CachedResponse {
        content: "first".to_string(),
        usage: TokenUsage::default(),
    };
    let second = CachedResponse {
        content: "second".to_string(),
        usage: TokenUsage::default(),
    };

    db.cache
        .store(user, &key, &first, Duration::from_secs(3600))
        .await
        .unwrap();
    db.cache
        .store(user, &key, &second, Duration::from_secs(3600))
        .await
        .unwrap();

    let hit = db.cache.lookup(user, &key).await.unwrap().unwrap();
    assert_eq!(hit.content, "second");
}

#[tokio::test]
async fn test_audit_append() {
    let Some(db) = test_db("test_audit_append").await else {
        return;
    };

    let event = AuditEvent {
        event_type: AuditEventType::RequestReceived,
        user_id: Some(Uuid::new_v4()),
        severity: Severity::Low,
        success: true,
        detail: serde_json::json!({"request_type": "chat"}),
    };
    db.audit.append(&event).await.unwrap();

    // Unauthenticated events carry no user id.
    let anonymous = AuditEvent {
        event_type: AuditEventType::UnauthorizedAttempt,
        user_id: None,
        severity: Severity::High,
        success: false,
        detail: serde_json::json!({"reason": "missing bearer token"}),
    };
    db.audit.append(&anonymous).await.unwrap();
}
