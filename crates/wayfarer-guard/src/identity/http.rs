//! HTTP identity provider.
//!
//! Resolves bearer tokens by calling `GET {base}/user` on a remote auth
//! service with the caller's token forwarded.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use wayfarer_guard::HttpIdentity;
//!
//! let identity = HttpIdentity::new("https://auth.example.com", Some("anon-key".into()), Duration::from_secs(5))
//!     .expect("client");
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::GuardError;
use crate::model::Identity;
use crate::traits::IdentityProvider;

/// Identity provider that delegates to a remote auth service.
#[derive(Debug)]
pub struct HttpIdentity {
    client: Client,
    user_url: String,
    api_key: Option<String>,
}

impl HttpIdentity {
    /// Create a provider with a request timeout.
    ///
    /// `api_key` is sent as the `apikey` header when the service requires a
    /// project key alongside the user token.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GuardError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GuardError::Configuration(format!("identity client: {e}")))?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    /// Create with a custom reqwest [`Client`].
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let base = base_url.into();
        let base = base.trim_end_matches('/');
        Self {
            client,
            user_url: format!("{base}/user"),
            api_key,
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentity {
    async fn current_user(&self, token: &str) -> Result<Option<Identity>, GuardError> {
        if token.is_empty() {
            return Ok(None);
        }

        let mut req = self.client.get(&self.user_url).bearer_auth(token);
        if let Some(ref key) = self.api_key {
            req = req.header("apikey", key);
        }
        let resp = req.send().await.map_err(GuardError::upstream)?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            s if !s.is_success() => {
                return Err(GuardError::Upstream(format!(
                    "identity service returned HTTP {}",
                    s.as_u16()
                )));
            }
            _ => {}
        }

        let user: Identity = resp.json().await.map_err(GuardError::upstream)?;
        if user.id.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use serde_json::json;

    use super::*;

    async fn spawn_auth_service() -> String {
        async fn user(headers: HeaderMap) -> (StatusCode, axum::Json<serde_json::Value>) {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            match auth {
                "Bearer good" => (
                    StatusCode::OK,
                    axum::Json(json!({"id": "alice", "email": "alice@example.com"})),
                ),
                "Bearer boom" => (StatusCode::BAD_GATEWAY, axum::Json(json!({}))),
                _ => (StatusCode::UNAUTHORIZED, axum::Json(json!({"msg": "invalid"}))),
            }
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/user", get(user));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_resolves_valid_token() {
        let base = spawn_auth_service().await;
        let identity = HttpIdentity::new(base, None, Duration::from_secs(5)).unwrap();
        let user = identity.current_user("good").await.unwrap().unwrap();
        assert_eq!(user.id, "alice");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn test_rejected_token_is_none() {
        let base = spawn_auth_service().await;
        let identity = HttpIdentity::new(base, Some("k".into()), Duration::from_secs(5)).unwrap();
        assert!(identity.current_user("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_service_failure_is_upstream() {
        let base = spawn_auth_service().await;
        let identity = HttpIdentity::new(base, None, Duration::from_secs(5)).unwrap();
        let err = identity.current_user("boom").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
