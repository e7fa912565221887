//! Token refresh gateway
//!
//! Performs the refresh network call and writes the renewed token into the
//! shared [`TokenStore`]. Used by both the HTTP client and the notification
//! stream when they hit an auth failure.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Path of the token refresh endpoint
pub const REFRESH_PATH: &str = "/v1/auth/refresh";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Renews the access token against the refresh endpoint
///
/// The refresh call authenticates with credential cookies, which the shared
/// `reqwest::Client` (built with a cookie store) attaches automatically.
/// Concurrent callers are coalesced: the first caller performs the network
/// call while the rest wait on the in-flight guard and reuse its result.
pub struct AuthGateway {
    http: reqwest::Client,
    refresh_url: String,
    tokens: Arc<TokenStore>,
    inflight: Mutex<()>,
}

impl AuthGateway {
    pub fn new(http: reqwest::Client, config: &ClientConfig, tokens: Arc<TokenStore>) -> Self {
        Self {
            http,
            refresh_url: config.api_url(REFRESH_PATH),
            tokens,
            inflight: Mutex::new(()),
        }
    }

    /// Obtain a fresh access token and store it
    ///
    /// Fails with [`ApiError::AuthExpired`] when the refresh endpoint itself
    /// rejects the credentials. Retry policy lives in callers; this method
    /// never retries internally.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let seen = self.tokens.generation();
        let _guard = self.inflight.lock().await;

        // Another caller may have completed a refresh while we waited.
        if self.tokens.generation() != seen {
            if let Some(token) = self.tokens.get() {
                debug!("token already renewed by a concurrent refresh");
                return Ok(token);
            }
        }

        let response = self.http.post(&self.refresh_url).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("refresh endpoint rejected credentials: {}", status);
            return Err(ApiError::AuthExpired);
        }
        if !status.is_success() {
            warn!("refresh failed with status {}", status);
            return Err(ApiError::status(status));
        }

        let body: RefreshResponse = response.json().await?;
        self.tokens.set(body.access_token.clone());
        debug!("access token renewed");
        Ok(body.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_url_joins_base() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9000")
            .build()
            .unwrap();
        let gateway = AuthGateway::new(
            reqwest::Client::new(),
            &config,
            Arc::new(TokenStore::new()),
        );
        assert_eq!(gateway.refresh_url, "http://127.0.0.1:9000/v1/auth/refresh");
    }

    #[test]
    fn test_refresh_response_decodes_access_token() {
        let body = r#"{"accessToken": "tok-1"}"#;
        let parsed: RefreshResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.access_token, "tok-1");
    }
}
