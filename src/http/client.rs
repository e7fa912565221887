//! Resilient HTTP client
//!
//! Wraps outgoing REST calls with the session-renewal policy:
//!
//! 1. Attach the current token (if any) as a bearer credential.
//! 2. Issue the request. Any non-401 outcome is returned unchanged.
//! 3. A 401 from the refresh endpoint itself is terminal: teardown,
//!    `SessionExpired`.
//! 4. A first 401 triggers one token refresh and one re-issue of the
//!    original request, whose outcome is returned as-is.
//! 5. A 401 on the retried request is terminal; never a second refresh for
//!    the same logical request.

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::{AuthGateway, TeardownGuard, TokenStore, REFRESH_PATH};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{ApiRequest, RetryContext};

/// REST client with transparent token renewal
///
/// Concurrent in-flight requests that each hit a 401 are each individually
/// safe: the refresh itself is coalesced by [`AuthGateway`], and every
/// request retries with whatever token is current at retry time.
pub struct ResilientHttpClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    tokens: Arc<TokenStore>,
    auth: Arc<AuthGateway>,
    teardown: Arc<TeardownGuard>,
}

impl ResilientHttpClient {
    pub fn new(
        http: reqwest::Client,
        config: Arc<ClientConfig>,
        tokens: Arc<TokenStore>,
        auth: Arc<AuthGateway>,
        teardown: Arc<TeardownGuard>,
    ) -> Self {
        Self {
            http,
            config,
            tokens,
            auth,
            teardown,
        }
    }

    /// Send a request, renewing the session once if it has expired
    ///
    /// Non-auth errors (network failures, 4xx/5xx other than 401) propagate
    /// unchanged. An unrecoverable 401 fails with [`ApiError::SessionExpired`]
    /// after triggering the idempotent session teardown.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let mut ctx = RetryContext::default();
        loop {
            let response = self.dispatch(&request).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if request.path == REFRESH_PATH {
                // The renewal endpoint itself rejected us; nothing to renew with.
                warn!("refresh endpoint returned 401, session is unrecoverable");
                self.teardown.trigger();
                return Err(ApiError::SessionExpired);
            }

            if ctx.attempted {
                warn!(path = %request.path, "401 after retry, session is unrecoverable");
                self.teardown.trigger();
                return Err(ApiError::SessionExpired);
            }

            debug!(path = %request.path, "401 received, refreshing token");
            match self.auth.refresh().await {
                Ok(_) => {
                    ctx = ctx.retried();
                }
                Err(err) => {
                    warn!("token refresh failed: {}", err);
                    self.teardown.trigger();
                    return Err(ApiError::SessionExpired);
                }
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = self.config.api_url(&request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        // Read the token lazily so a refresh completed by any other path is
        // picked up by this dispatch.
        if let Some(token) = self.tokens.get() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::get(path)).await?;
        Self::decode(response).await
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::post(path).json(body)?).await?;
        Self::decode(response).await
    }

    /// PUT a JSON body and decode the JSON response
    pub async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::put(path).json(body)?).await?;
        Self::decode(response).await
    }

    /// DELETE a resource
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.send(ApiRequest::delete(path)).await?;
        if !response.status().is_success() {
            return Err(ApiError::status(response.status()));
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::status(response.status()));
        }
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for ResilientHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientHttpClient")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}
