//! Gateway server binary.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scribe_core::defaults;
use scribe_db::{Database, FilesystemStore};
use scribe_gateway::audit::AuditRecorder;
use scribe_gateway::{router, AppState, LimitResolver, Orchestrator, StaticTokenProvider};
use scribe_upstream::{ChatCompletionBackend, UpstreamConfig, UpstreamDispatcher, WhisperBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var(defaults::ENV_DATABASE_URL)
        .with_context(|| format!("{} is not set", defaults::ENV_DATABASE_URL))?;
    let db = Database::connect(&database_url)
        .await
        .context("connecting to PostgreSQL")?;
    db.migrate().await.context("running migrations")?;
    scribe_db::log_pool_metrics(db.pool());

    let upstream_config = UpstreamConfig::from_env();
    info!(
        subsystem = "gateway",
        base_url = %upstream_config.base_url,
        chat_model = %upstream_config.chat_model,
        transcribe_model = %upstream_config.transcribe_model,
        "Upstream configured"
    );
    let chat_model = upstream_config.chat_model.clone();
    let chat = Arc::new(ChatCompletionBackend::new(upstream_config.clone())?);
    let whisper = Arc::new(WhisperBackend::new(upstream_config)?);

    let audio_store_path = std::env::var(defaults::ENV_AUDIO_STORE_PATH)
        .unwrap_or_else(|_| "/var/lib/scribe/audio".to_string());
    let objects = Arc::new(FilesystemStore::new(&audio_store_path));
    if let Err(e) = objects.validate().await {
        warn!(
            subsystem = "gateway",
            path = %audio_store_path,
            error = %e,
            "Audio store directory is not readable; storage references will fail"
        );
    }

    let dispatcher = Arc::new(UpstreamDispatcher::new(chat, whisper, objects));

    let identity = StaticTokenProvider::from_env()?;
    if identity.is_empty() {
        warn!(
            subsystem = "gateway",
            "No API tokens configured; every request will be rejected"
        );
    }

    let Database {
        usage,
        limits,
        cache,
        audit,
        ..
    } = db;

    let orchestrator = Orchestrator::new(
        Arc::new(identity),
        Arc::new(usage),
        LimitResolver::new(Arc::new(limits)),
        Arc::new(cache),
        dispatcher,
        AuditRecorder::new(Arc::new(audit)),
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        chat_model,
    };

    let bind_addr = std::env::var(defaults::ENV_BIND_ADDR)
        .unwrap_or_else(|_| defaults::BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(subsystem = "gateway", addr = %bind_addr, "Gateway listening");

    axum::serve(listener, router(state))
        .await
        .context("serving HTTP")?;

    Ok(())
}
