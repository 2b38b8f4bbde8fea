//! Scripted mock backends for deterministic testing.
//!
//! Enabled for this crate's own tests and, behind the `mock` feature, for
//! orchestrator tests in the gateway crate. Every mock counts its calls so
//! tests can assert that no upstream call was attempted on fail-fast paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use scribe_core::{
    ChatBackend, ChatMessage, ChatOutcome, Error, ObjectStore, Result, TokenUsage, Transcript,
    TranscriptionBackend,
};

/// Shared call counter handed out by the mocks.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicU32>);

impl CallCounter {
    /// Number of calls recorded so far.
    pub fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    fn record(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// Scripted chat backend.
pub struct MockChatBackend {
    response: String,
    usage: TokenUsage,
    transient_failures: AtomicU32,
    permanent_failure: bool,
    calls: CallCounter,
}

impl MockChatBackend {
    /// A backend that always returns `response` with 30 total tokens.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            },
            transient_failures: AtomicU32::new(0),
            permanent_failure: false,
            calls: CallCounter::default(),
        }
    }

    /// Report this token usage on success.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Fail the first `n` calls with a rate-limit signal.
    pub fn with_transient_failures(self, n: u32) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every call with a permanent upstream error.
    pub fn with_permanent_failure(mut self) -> Self {
        self.permanent_failure = true;
        self
    }

    /// Handle to this backend's call counter.
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn chat_complete(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _temperature: f32,
    ) -> Result<ChatOutcome> {
        self.calls.record();

        if self.permanent_failure {
            return Err(Error::Upstream("mock permanent failure".to_string()));
        }
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::UpstreamRateLimited("mock 429".to_string()));
        }

        Ok(ChatOutcome {
            content: self.response.clone(),
            usage: self.usage,
        })
    }
}

/// Scripted transcription backend.
pub struct MockTranscriptionBackend {
    text: String,
    transient_failures: AtomicU32,
    calls: CallCounter,
}

impl MockTranscriptionBackend {
    /// A backend that always returns `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            transient_failures: AtomicU32::new(0),
            calls: CallCounter::default(),
        }
    }

    /// Fail the first `n` calls with a rate-limit signal.
    pub fn with_transient_failures(self, n: u32) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Handle to this backend's call counter.
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl TranscriptionBackend for MockTranscriptionBackend {
    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> Result<Transcript> {
        self.calls.record();

        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::UpstreamRateLimited("mock 429".to_string()));
        }

        Ok(Transcript {
            text: self.text.clone(),
        })
    }
}

/// In-memory object store.
pub struct MockObjectStore {
    objects: HashMap<String, Vec<u8>>,
    denied: Vec<String>,
    read_delay: Option<Duration>,
    calls: CallCounter,
}

impl MockObjectStore {
    /// An empty store; every read misses.
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            denied: Vec::new(),
            read_delay: None,
            calls: CallCounter::default(),
        }
    }

    /// Seed an object at `path`.
    pub fn with_object(mut self, path: impl Into<String>, data: Vec<u8>) -> Self {
        self.objects.insert(path.into(), data);
        self
    }

    /// Make reads of `path` fail with a permission error.
    pub fn with_permission_denied(mut self, path: impl Into<String>) -> Self {
        self.denied.push(path.into());
        self
    }

    /// Delay every read, for exercising the storage read timeout.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Handle to this store's call counter.
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.calls.record();

        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if self.denied.iter().any(|p| p == path) {
            return Err(Error::StoragePermissionDenied(path.to_string()));
        }
        self.objects
            .get(path)
            .cloned()
            .ok_or_else(|| Error::StorageNotFound(path.to_string()))
    }
}
