//! Access token storage
//!
//! Single shared holder of the current access token. Both the HTTP client
//! and the notification stream read the latest value lazily at the point of
//! use, so a refresh triggered by one path benefits the other. Readers
//! during a refresh window always see either the old token or the fully
//! updated one, never a torn value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Shared access token holder
///
/// All writes flow through [`AuthGateway`](crate::auth::AuthGateway)'s
/// successful refresh result (or an explicit login/logout by the host
/// application); other components only read.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
    generation: AtomicU64,
}

impl TokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current token, if any
    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the stored token
    pub fn set(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token.into());
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Clear the token (logout)
    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Monotonic counter bumped on every `set`/`clear`
    ///
    /// Lets a refresh caller detect that another caller already replaced the
    /// token while it waited for the in-flight guard.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
