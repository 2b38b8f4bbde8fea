//! Upstream dispatcher: the single seam the orchestrator calls for both
//! operation types.
//!
//! Owns the retry budget, the inline-payload size discipline, and the
//! materialization of storage references. Has no side effects beyond the
//! outbound network call; usage accounting and caching are sequenced by the
//! orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use scribe_core::{
    defaults, AudioSource, ChatBackend, ChatMessage, ChatOutcome, Error, ObjectStore, Result,
    Transcript, TranscriptionBackend,
};

use crate::retry::{retry_with_backoff, RetryPolicy};

/// Dispatches chat completion and transcription calls to the upstream.
pub struct UpstreamDispatcher {
    chat: Arc<dyn ChatBackend>,
    transcriber: Arc<dyn TranscriptionBackend>,
    objects: Arc<dyn ObjectStore>,
    retry: RetryPolicy,
    max_inline_audio_bytes: usize,
    storage_read_timeout: Duration,
}

impl UpstreamDispatcher {
    /// Create a dispatcher with the default retry policy and size limits.
    pub fn new(
        chat: Arc<dyn ChatBackend>,
        transcriber: Arc<dyn TranscriptionBackend>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            chat,
            transcriber,
            objects,
            retry: RetryPolicy::default(),
            max_inline_audio_bytes: defaults::MAX_INLINE_AUDIO_BYTES,
            storage_read_timeout: Duration::from_secs(defaults::STORAGE_READ_TIMEOUT_SECS),
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the inline audio size threshold.
    pub fn with_max_inline_audio_bytes(mut self, bytes: usize) -> Self {
        self.max_inline_audio_bytes = bytes;
        self
    }

    /// Override the storage read timeout.
    pub fn with_storage_read_timeout(mut self, timeout: Duration) -> Self {
        self.storage_read_timeout = timeout;
        self
    }

    /// Perform a chat completion, retrying transient upstream failures.
    pub async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> Result<ChatOutcome> {
        retry_with_backoff(&self.retry, "chat_complete", || {
            self.chat.chat_complete(messages, model, temperature)
        })
        .await
    }

    /// Transcribe audio from an inline payload or a storage reference,
    /// retrying transient upstream failures.
    ///
    /// Inline payloads are checked against the size threshold before any
    /// network call; oversized input is rejected without upstream spend.
    /// Storage references are materialized under a dedicated read timeout,
    /// distinct from the transcription call's own timeout.
    pub async fn transcribe(&self, source: &AudioSource, mime_type: &str) -> Result<Transcript> {
        let audio: Vec<u8> = match source {
            AudioSource::Inline(bytes) => {
                if bytes.len() > self.max_inline_audio_bytes {
                    return Err(Error::PayloadTooLarge(format!(
                        "Inline audio is {} bytes; the limit is {} bytes",
                        bytes.len(),
                        self.max_inline_audio_bytes
                    )));
                }
                bytes.clone()
            }
            AudioSource::StorageRef(path) => self.materialize(path).await?,
        };

        if audio.is_empty() {
            return Err(Error::InvalidInput("Audio payload is empty".to_string()));
        }

        retry_with_backoff(&self.retry, "transcribe", || {
            self.transcriber.transcribe(&audio, mime_type)
        })
        .await
    }

    /// Fetch a storage reference, classifying a slow read as StorageTimeout.
    async fn materialize(&self, path: &str) -> Result<Vec<u8>> {
        debug!(
            subsystem = "upstream",
            component = "dispatcher",
            op = "materialize",
            storage_path = %path,
            timeout_secs = self.storage_read_timeout.as_secs(),
            "Materializing storage reference"
        );

        match tokio::time::timeout(self.storage_read_timeout, self.objects.read(path)).await {
            Ok(result) => result,
            Err(_) => Err(Error::StorageTimeout(path.to_string())),
        }
    }
}
