//! Resilient HTTP layer
//!
//! REST calls ride through [`ResilientHttpClient`], which attaches the
//! current bearer token and transparently runs the refresh-then-retry-once
//! policy on 401 responses.

pub mod client;
pub mod request;

pub use client::ResilientHttpClient;
pub use request::{ApiRequest, RetryContext};
