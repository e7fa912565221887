//! Agora Client - Session Resilience Core
//!
//! Client-side plumbing for the Agora community platform (channels, posts,
//! comments, notifications). This crate covers the parts that have to
//! survive network flakiness and token expiry without leaking connections
//! or duplicating retries:
//!
//! - **REST resilience** - [`http::ResilientHttpClient`] attaches the
//!   current bearer token to every call and, on a 401, runs exactly one
//!   token refresh and one retry before declaring the session expired.
//! - **Notification streaming** - [`notifications::NotificationStream`]
//!   keeps at most one SSE connection to the notification feed alive,
//!   reconnecting with capped exponential backoff and surfacing a
//!   connection status signal instead of raw errors.
//! - **Shared session state** - [`auth::TokenStore`] holds the one access
//!   token both paths read lazily, [`auth::AuthGateway`] renews it with
//!   coalesced refresh calls, and [`auth::TeardownGuard`] makes the
//!   logout-and-redirect hook fire at most once.
//!
//! UI composition, routing and storage are the host application's concern;
//! it injects its teardown hook and calls into this crate.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use agora_client::{AgoraClient, ClientConfig};
//! use agora_client::auth::NoopTeardown;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::builder()
//!     .base_url("https://agora.example.com")
//!     .build()?;
//! let client = AgoraClient::new(config, Arc::new(NoopTeardown))?;
//!
//! client.set_token("access-token-from-login");
//! client.notifications().start().await?;
//!
//! let channels: serde_json::Value = client.http().get_json("/v1/channels").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod notifications;
pub mod session;

pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use error::{ApiError, StreamError};
pub use session::AgoraClient;
