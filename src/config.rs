//! Client configuration
//!
//! Provides the configuration shared by the HTTP client and the
//! notification stream: the API base URL, the connection timeout used when
//! establishing the SSE stream, and the reconnection/backoff knobs.

use std::time::Duration;
use thiserror::Error;

/// Default server URL
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Environment variable that overrides the default base URL
const BASE_URL_ENV: &str = "AGORA_API_URL";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without a trailing path
    pub base_url: String,
    /// Bound on how long a stream connection attempt may take
    pub connect_timeout: Duration,
    /// Consecutive failed stream connection attempts before giving up
    pub max_retries: u32,
    /// First reconnect delay; doubles on each failed attempt
    pub backoff_base: Duration,
    /// Ceiling on the reconnect delay
    pub backoff_max: Duration,
    /// Upper bound of the random jitter added to each delay
    pub backoff_jitter_max: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            max_retries: 5,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
            backoff_jitter_max: Duration::from_millis(250),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfigBuilder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    connect_timeout: Option<Duration>,
    max_retries: Option<u32>,
    backoff_base: Option<Duration>,
    backoff_max: Option<Duration>,
    backoff_jitter_max: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the API base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the stream connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the reconnect attempt cap
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the initial reconnect delay
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = Some(base);
        self
    }

    /// Set the reconnect delay ceiling
    pub fn backoff_max(mut self, max: Duration) -> Self {
        self.backoff_max = Some(max);
        self
    }

    /// Set the jitter upper bound
    pub fn backoff_jitter_max(mut self, jitter: Duration) -> Self {
        self.backoff_jitter_max = Some(jitter);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let defaults = ClientConfig::default();
        let config = ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            backoff_base: self.backoff_base.unwrap_or(defaults.backoff_base),
            backoff_max: self.backoff_max.unwrap_or(defaults.backoff_max),
            backoff_jitter_max: self
                .backoff_jitter_max
                .unwrap_or(defaults.backoff_jitter_max),
        };

        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(config.base_url));
        }
        if config.backoff_base > config.backoff_max {
            return Err(ConfigError::InvalidBackoff {
                base: config.backoff_base,
                max: config.backoff_max,
            });
        }
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("backoff base {base:?} exceeds ceiling {max:?}")]
    InvalidBackoff { base: Duration, max: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert_eq!(config.backoff_max, Duration::from_secs(30));
    }

    #[test]
    fn test_api_url() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:3000")
            .build()
            .unwrap();
        let url = config.api_url("/v1/auth/refresh");
        assert_eq!(url, "http://127.0.0.1:3000/v1/auth/refresh");
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:3000/")
            .build()
            .unwrap();
        let url = config.api_url("/v1/notifications/subscribe");
        assert_eq!(url, "http://127.0.0.1:3000/v1/notifications/subscribe");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = ClientConfig::builder().base_url("not-a-url").build();
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_backoff_base_above_max_rejected() {
        let result = ClientConfig::builder()
            .backoff_base(Duration::from_secs(60))
            .backoff_max(Duration::from_secs(30))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidBackoff { .. })));
    }
}
