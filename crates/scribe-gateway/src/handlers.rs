//! HTTP handlers and the request body schema for the generation endpoint.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use utoipa::OpenApi;

use scribe_core::{
    defaults, AudioSource, ChatMessage, Error, GenerationRequest, GenerationResponse, Result,
};

use crate::error::ApiError;
use crate::identity::bearer_token;
use crate::AppState;

/// Request kind; defaults to chat when omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    #[default]
    Chat,
    Transcription,
}

/// Wire shape of a generation request.
///
/// Chat fields and transcription fields share one body; which set is
/// required depends on `type`. Validation happens in [`Self::into_request`],
/// before the orchestrator is involved.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateRequest {
    #[serde(rename = "type")]
    pub request_type: RequestType,

    // Chat fields
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Caller-supplied content identifier; presence enables response caching.
    pub file_hash: Option<String>,

    // Transcription fields
    pub storage_path: Option<String>,
    pub audio_base64: Option<String>,
    pub mime_type: Option<String>,
}

impl GenerateRequest {
    /// Validate the body into a typed request.
    pub fn into_request(self, default_model: &str) -> Result<GenerationRequest> {
        match self.request_type {
            RequestType::Chat => {
                if self.messages.is_empty() {
                    return Err(Error::InvalidInput(
                        "messages must not be empty".to_string(),
                    ));
                }
                let temperature = self.temperature.unwrap_or(defaults::DEFAULT_TEMPERATURE);
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(Error::InvalidInput(format!(
                        "temperature {temperature} is outside 0.0..=2.0"
                    )));
                }
                Ok(GenerationRequest::Chat {
                    messages: self.messages,
                    model: self
                        .model
                        .unwrap_or_else(|| default_model.to_string()),
                    temperature,
                    file_hash: self.file_hash,
                })
            }
            RequestType::Transcription => {
                let source = match (self.storage_path, self.audio_base64) {
                    (Some(_), Some(_)) => {
                        return Err(Error::InvalidInput(
                            "storagePath and audioBase64 are mutually exclusive".to_string(),
                        ))
                    }
                    (None, None) => {
                        return Err(Error::InvalidInput(
                            "one of storagePath or audioBase64 is required".to_string(),
                        ))
                    }
                    (Some(path), None) => {
                        if path.is_empty() {
                            return Err(Error::InvalidInput(
                                "storagePath must not be empty".to_string(),
                            ));
                        }
                        AudioSource::StorageRef(path)
                    }
                    (None, Some(encoded)) => {
                        let bytes = BASE64.decode(encoded.as_bytes()).map_err(|e| {
                            Error::InvalidInput(format!("audioBase64 is not valid base64: {e}"))
                        })?;
                        AudioSource::Inline(bytes)
                    }
                };
                Ok(GenerationRequest::Transcription {
                    source,
                    mime_type: self
                        .mime_type
                        .unwrap_or_else(|| defaults::DEFAULT_AUDIO_MIME.to_string()),
                })
            }
        }
    }
}

/// Handle a generation request.
#[utoipa::path(
    post,
    path = "/api/v1/generate",
    tag = "generate",
    responses(
        (status = 200, description = "Generation result"),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Missing or unknown bearer token"),
        (status = 413, description = "Inline audio exceeds the size limit"),
        (status = 429, description = "Daily generation limit reached"),
        (status = 502, description = "Upstream model API failure"),
        (status = 504, description = "Upstream or storage read timed out"),
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateRequest>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    let bearer = bearer_token(&headers);
    let request = body.into_request(&state.chat_model)?;
    let response = state.orchestrator.handle(bearer, request).await?;

    Ok(Json(match response {
        GenerationResponse::Chat { content } => json!({ "content": content }),
        GenerationResponse::Transcription { text } => json!({ "text": text }),
    }))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service healthy"))
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Serve the OpenAPI document.
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::ApiDoc::openapi())
}
