//! # scribe-gateway
//!
//! HTTP gateway for Scribe AI generation requests.
//!
//! Exposes a single generation endpoint that authenticates the caller,
//! enforces the per-user daily quota, serves repeat chat requests from the
//! content-addressed response cache, and dispatches the rest to the upstream
//! model API. Every request leaves an audit trail.

pub mod audit;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod orchestrator;
pub mod quota;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use scribe_core::defaults;

pub use error::ApiError;
pub use identity::StaticTokenProvider;
pub use orchestrator::Orchestrator;
pub use quota::LimitResolver;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Configured default chat model, applied when the body omits one.
    pub chat_model: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(handlers::generate, handlers::health),
    tags(
        (name = "generate", description = "AI generation requests"),
        (name = "system", description = "Health and metadata")
    )
)]
pub struct ApiDoc;

/// Build the gateway router with tracing, CORS, and the request body cap.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/generate", post(handlers::generate))
        .route("/health", get(handlers::health))
        .route("/api/openapi.json", get(handlers::openapi))
        .layer(DefaultBodyLimit::max(defaults::MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
