//! Upstream model API configuration.
//!
//! Resolved once at process start and injected into the backends; never read
//! ad hoc from the environment during request handling.

use scribe_core::defaults;

/// Configuration for the upstream model API.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL for the OpenAI-compatible API endpoint.
    pub base_url: String,
    /// Bearer token for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Default model for chat completion.
    pub chat_model: String,
    /// Model for audio transcription.
    pub transcribe_model: String,
    /// Chat completion request timeout in seconds.
    pub chat_timeout_secs: u64,
    /// Transcription request timeout in seconds.
    pub transcribe_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_UPSTREAM_URL.to_string(),
            api_key: None,
            chat_model: defaults::DEFAULT_CHAT_MODEL.to_string(),
            transcribe_model: defaults::DEFAULT_TRANSCRIBE_MODEL.to_string(),
            chat_timeout_secs: defaults::CHAT_TIMEOUT_SECS,
            transcribe_timeout_secs: defaults::TRANSCRIBE_TIMEOUT_SECS,
        }
    }
}

impl UpstreamConfig {
    /// Create from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(defaults::ENV_UPSTREAM_BASE_URL)
                .unwrap_or_else(|_| defaults::DEFAULT_UPSTREAM_URL.to_string()),
            api_key: std::env::var(defaults::ENV_UPSTREAM_API_KEY).ok(),
            chat_model: std::env::var(defaults::ENV_CHAT_MODEL)
                .unwrap_or_else(|_| defaults::DEFAULT_CHAT_MODEL.to_string()),
            transcribe_model: std::env::var(defaults::ENV_TRANSCRIBE_MODEL)
                .unwrap_or_else(|_| defaults::DEFAULT_TRANSCRIBE_MODEL.to_string()),
            chat_timeout_secs: defaults::CHAT_TIMEOUT_SECS,
            transcribe_timeout_secs: defaults::TRANSCRIBE_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UpstreamConfig::default();
        assert_eq!(config.base_url, defaults::DEFAULT_UPSTREAM_URL);
        assert_eq!(config.chat_model, defaults::DEFAULT_CHAT_MODEL);
        assert_eq!(config.transcribe_model, defaults::DEFAULT_TRANSCRIBE_MODEL);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_custom_config() {
        let config = UpstreamConfig {
            base_url: "http://localhost:8080/v1".to_string(),
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
    }
}
