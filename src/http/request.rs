//! Request descriptions
//!
//! An [`ApiRequest`] carries everything needed to issue a call and, when a
//! 401 forces a token refresh, to re-issue the same call once. The retry
//! flag is not hidden on the request itself; it travels separately as an
//! explicit [`RetryContext`].

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;

use crate::error::ApiError;

/// A re-issuable description of one REST call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Endpoint path, joined onto the configured base URL
    pub path: String,
    /// Optional JSON body
    pub body: Option<serde_json::Value>,
    /// Extra headers beyond the bearer credential
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach an extra header
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Explicit one-shot retry flag threaded through the send loop
///
/// A request starts un-attempted; after the single refresh-and-retry cycle
/// it is marked, and a further 401 is terminal for that logical request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryContext {
    /// Whether the refresh-and-retry cycle already ran for this request
    pub attempted: bool,
}

impl RetryContext {
    /// The context after the one permitted retry has been consumed
    pub fn retried(self) -> Self {
        Self { attempted: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_request() {
        let request = ApiRequest::get("/v1/channels");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/v1/channels");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_json_body() {
        let request = ApiRequest::post("/v1/posts")
            .json(&serde_json::json!({ "title": "hello" }))
            .unwrap();
        assert_eq!(request.body.unwrap()["title"], "hello");
    }

    #[test]
    fn test_extra_header() {
        let request = ApiRequest::get("/v1/posts").header(
            HeaderName::from_static("x-client-version"),
            HeaderValue::from_static("0.1.0"),
        );
        assert_eq!(
            request.headers.get("x-client-version").unwrap(),
            &HeaderValue::from_static("0.1.0")
        );
    }

    #[test]
    fn test_retry_context_one_shot() {
        let ctx = RetryContext::default();
        assert!(!ctx.attempted);
        let retried = ctx.retried();
        assert!(retried.attempted);
        // Idempotent: retrying a retried context stays terminal.
        assert!(retried.retried().attempted);
    }
}
