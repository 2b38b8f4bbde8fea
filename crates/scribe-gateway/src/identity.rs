//! Static bearer-token identity provider.
//!
//! Tokens are loaded once at startup from a JSON array in the environment.
//! Each entry maps an opaque token to a user identity and account class.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;
use uuid::Uuid;

use scribe_core::{defaults, AccountClass, Error, Identity, IdentityProvider, Result};

/// One configured API token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEntry {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub exempt: bool,
}

/// Identity provider backed by a fixed token table.
pub struct StaticTokenProvider {
    by_token: HashMap<String, Identity>,
}

impl StaticTokenProvider {
    /// Build from a list of token entries.
    pub fn new(entries: Vec<TokenEntry>) -> Self {
        let by_token = entries
            .into_iter()
            .map(|e| {
                let class = if e.exempt {
                    AccountClass::Exempt
                } else {
                    AccountClass::Standard
                };
                (
                    e.token,
                    Identity {
                        user_id: e.user_id,
                        email: e.email,
                        class,
                    },
                )
            })
            .collect();
        Self { by_token }
    }

    /// Load the token table from `SCRIBE_API_TOKENS` (a JSON array).
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(defaults::ENV_API_TOKENS).map_err(|_| {
            Error::Config(format!("{} is not set", defaults::ENV_API_TOKENS))
        })?;
        let entries: Vec<TokenEntry> = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("{} is not valid JSON: {e}", defaults::ENV_API_TOKENS))
        })?;
        Ok(Self::new(entries))
    }

    /// Number of configured tokens.
    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    /// Whether no tokens are configured.
    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn authenticate(&self, bearer_token: Option<&str>) -> Result<Identity> {
        let token =
            bearer_token.ok_or_else(|| Error::Unauthorized("Missing bearer token".to_string()))?;
        self.by_token
            .get(token)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Unknown token".to_string()))
    }
}

/// Extract the bearer token from the Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn provider() -> StaticTokenProvider {
        StaticTokenProvider::new(vec![
            TokenEntry {
                token: "tok-alice".to_string(),
                user_id: Uuid::from_u128(1),
                email: "alice@example.com".to_string(),
                exempt: false,
            },
            TokenEntry {
                token: "tok-ops".to_string(),
                user_id: Uuid::from_u128(2),
                email: "ops@example.com".to_string(),
                exempt: true,
            },
        ])
    }

    #[tokio::test]
    async fn test_known_token_resolves_identity() {
        let identity = provider().authenticate(Some("tok-alice")).await.unwrap();
        assert_eq!(identity.user_id, Uuid::from_u128(1));
        assert_eq!(identity.class, AccountClass::Standard);
    }

    #[tokio::test]
    async fn test_exempt_flag_sets_account_class() {
        let identity = provider().authenticate(Some("tok-ops")).await.unwrap();
        assert_eq!(identity.class, AccountClass::Exempt);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let err = provider().authenticate(None).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let err = provider().authenticate(Some("tok-nope")).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        // Never echo the presented token back.
        assert!(!err.to_string().contains("tok-nope"));
    }

    #[test]
    fn test_token_entry_parses_camel_case() {
        let entries: Vec<TokenEntry> = serde_json::from_str(
            r#"[{"token": "t", "userId": "00000000-0000-0000-0000-000000000001",
                 "email": "a@b.c", "exempt": true}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].exempt);
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-alice"),
        );
        assert_eq!(bearer_token(&headers), Some("tok-alice"));

        let mut bad = HeaderMap::new();
        bad.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcg=="),
        );
        assert_eq!(bearer_token(&bad), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
