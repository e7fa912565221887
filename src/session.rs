//! Client assembly
//!
//! Wires the shared pieces together: one `reqwest::Client` with a cookie
//! store (the refresh endpoint authenticates with credential cookies), one
//! [`TokenStore`] read by both the REST path and the stream path, one
//! refresh gateway, and one idempotent teardown guard shared by both.

use std::sync::Arc;

use crate::auth::{AuthGateway, SessionTeardown, TeardownGuard, TokenStore};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::ResilientHttpClient;
use crate::notifications::NotificationStream;

/// The assembled session-resilient client
pub struct AgoraClient {
    tokens: Arc<TokenStore>,
    http: ResilientHttpClient,
    notifications: NotificationStream,
}

impl AgoraClient {
    /// Build a client from a configuration and the host's teardown hook
    pub fn new(
        config: ClientConfig,
        teardown: Arc<dyn SessionTeardown>,
    ) -> Result<Self, ApiError> {
        let config = Arc::new(config);
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::transient(format!("failed to build HTTP client: {}", e)))?;

        let tokens = Arc::new(TokenStore::new());
        let auth = Arc::new(AuthGateway::new(
            http.clone(),
            &config,
            Arc::clone(&tokens),
        ));
        let guard = Arc::new(TeardownGuard::new(teardown));

        let rest = ResilientHttpClient::new(
            http.clone(),
            Arc::clone(&config),
            Arc::clone(&tokens),
            Arc::clone(&auth),
            Arc::clone(&guard),
        );
        let notifications = NotificationStream::new(http, config, Arc::clone(&tokens), auth, guard);

        Ok(Self {
            tokens,
            http: rest,
            notifications,
        })
    }

    /// Seed the token after a login performed by the host application
    pub fn set_token(&self, token: impl Into<String>) {
        self.tokens.set(token);
    }

    /// Drop the stored token (logout) and close the stream
    pub fn clear_session(&self) {
        self.notifications.cancel();
        self.tokens.clear();
    }

    /// REST client with transparent token renewal
    pub fn http(&self) -> &ResilientHttpClient {
        &self.http
    }

    /// Notification stream client
    pub fn notifications(&self) -> &NotificationStream {
        &self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoopTeardown;

    #[test]
    fn test_assembly() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:3000")
            .build()
            .unwrap();
        let client = AgoraClient::new(config, Arc::new(NoopTeardown)).unwrap();
        client.set_token("tok");
        client.clear_session();
        assert!(client.notifications().notifications().is_empty());
    }
}
