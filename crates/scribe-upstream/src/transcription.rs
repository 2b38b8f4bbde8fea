//! Whisper-compatible audio transcription backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use scribe_core::{Error, Result, Transcript, TranscriptionBackend};

use crate::chat::{classify_status, upstream_error_message};
use crate::config::UpstreamConfig;

/// Whisper API response format.
#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Map a MIME type to the file extension the upload is labelled with.
fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        "audio/aac" => "aac",
        "audio/mp4" | "audio/m4a" => "m4a",
        _ => "webm",
    }
}

/// OpenAI-compatible Whisper transcription backend.
pub struct WhisperBackend {
    client: Client,
    config: UpstreamConfig,
}

impl WhisperBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.transcribe_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Get the model name being used.
    pub fn model_name(&self) -> &str {
        &self.config.transcribe_model
    }
}

#[async_trait]
impl TranscriptionBackend for WhisperBackend {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<Transcript> {
        let url = format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );

        debug!(
            subsystem = "upstream",
            component = "transcribe",
            op = "transcribe",
            model = %self.config.transcribe_model,
            audio_bytes = audio.len(),
            mime_type,
            "Transcription request"
        );

        let file_part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(format!("audio.{}", extension_for_mime(mime_type)))
            .mime_str(mime_type)
            .map_err(|e| Error::InvalidInput(format!("Invalid MIME type {}: {}", mime_type, e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.transcribe_model.clone())
            .text("response_format", "json");

        let mut req = self.client.post(&url).multipart(form);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = upstream_error_message(response).await;
            return Err(classify_status(status, message));
        }

        let result: WhisperResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse whisper response: {}", e)))?;

        debug!(
            subsystem = "upstream",
            component = "transcribe",
            op = "transcribe",
            response_len = result.text.len(),
            "Transcription succeeded"
        );

        Ok(Transcript { text: result.text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for_mime("audio/mpeg"), "mp3");
        assert_eq!(extension_for_mime("audio/wav"), "wav");
        assert_eq!(extension_for_mime("audio/ogg"), "ogg");
        assert_eq!(extension_for_mime("audio/webm"), "webm");
        // Unknown types fall back to the default container
        assert_eq!(extension_for_mime("audio/unknown"), "webm");
    }

    #[test]
    fn test_whisper_response_parsing() {
        let json = r#"{"text": "Hello world"}"#;
        let parsed: WhisperResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text, "Hello world");
    }

    #[test]
    fn test_model_name() {
        let backend = WhisperBackend::new(UpstreamConfig::default()).unwrap();
        assert_eq!(
            backend.model_name(),
            scribe_core::defaults::DEFAULT_TRANSCRIBE_MODEL
        );
    }
}
