//! Error Types
//!
//! This module defines the error taxonomy for the session-resilience core.
//!
//! # Error Categories
//!
//! - `ApiError` - failures of individual REST calls, including the
//!   refresh-and-retry outcomes
//! - `StreamError` - failures reported by the notification stream
//!
//! Malformed SSE frames are intentionally absent: they are logged and
//! skipped inside the frame parser and never surface to callers.
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across task
//! boundaries.
use thiserror::Error;

/// Errors produced by REST calls through the resilient HTTP client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure (connect, read, TLS); retryable by the caller
    #[error("transient network error: {message}")]
    TransientNetwork {
        /// Human-readable error message
        message: String,
    },

    /// The refresh endpoint rejected the stored credentials
    #[error("access token expired and refresh was rejected")]
    AuthExpired,

    /// The session is unrecoverable; teardown has been triggered
    #[error("session expired")]
    SessionExpired,

    /// Non-auth HTTP error status, propagated unchanged
    #[error("server returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Request or response body could not be encoded/decoded
    #[error("serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },
}

impl ApiError {
    /// Create a new transient network error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientNetwork {
            message: message.into(),
        }
    }

    /// Create a new status error
    pub fn status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::serialization(format!("response decode error: {}", err))
        } else {
            Self::transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Errors produced when starting the notification stream
///
/// Mid-stream failures never surface as errors; callers observe them only
/// through the connection status signal.
#[derive(Debug, Error)]
pub enum StreamError {
    /// No token was available and the refresh attempt failed
    #[error("not authenticated")]
    Unauthenticated,

    /// Connection could not be established
    #[error("connection failed: {message}")]
    Connect {
        /// Human-readable error message
        message: String,
    },

    /// The startup timeout elapsed before the connection was established
    #[error("connection attempt timed out")]
    Timeout,

    /// All reconnection attempts were consumed
    #[error("retry budget exhausted after {attempts} attempts")]
    RetryBudgetExhausted {
        /// Number of failed attempts
        attempts: u32,
    },
}

impl StreamError {
    /// Create a new connection error
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_error() {
        let error = ApiError::transient("connection reset");
        match error {
            ApiError::TransientNetwork { message } => {
                assert_eq!(message, "connection reset");
            }
            _ => panic!("Expected TransientNetwork"),
        }
    }

    #[test]
    fn test_status_error_display() {
        let error = ApiError::status(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let display = format!("{}", error);
        assert!(display.contains("500"));
    }

    #[test]
    fn test_from_serde_error() {
        let invalid_json = "{ invalid json }";
        let result: Result<serde_json::Value, _> = serde_json::from_str(invalid_json);
        let serde_error = result.unwrap_err();
        let api_error: ApiError = serde_error.into();

        match api_error {
            ApiError::Serialization { .. } => {}
            _ => panic!("Expected Serialization from serde error"),
        }
    }

    #[test]
    fn test_stream_error_display() {
        let error = StreamError::RetryBudgetExhausted { attempts: 5 };
        let display = format!("{}", error);
        assert!(display.contains("5 attempts"));
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
        assert_send_sync::<StreamError>();
    }
}
