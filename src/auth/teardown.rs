//! Session teardown seam
//!
//! Teardown is a black-box collaborator owned by the host application: it
//! clears persisted session state and navigates back to the login entry
//! point. This module only defines the seam and the guard that keeps the
//! invocation idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

/// Host-application hook invoked on unrecoverable auth failure
pub trait SessionTeardown: Send + Sync {
    /// Clear session state and return the user to login
    fn teardown(&self);
}

/// Teardown that does nothing; useful for tests and headless tools
#[derive(Debug, Default)]
pub struct NoopTeardown;

impl SessionTeardown for NoopTeardown {
    fn teardown(&self) {}
}

/// At-most-once wrapper around a [`SessionTeardown`]
///
/// Both the HTTP client and the notification stream may conclude the session
/// is unrecoverable; whichever gets there first wins and the second trigger
/// is a no-op. The user is never double-navigated to login.
pub struct TeardownGuard {
    inner: Arc<dyn SessionTeardown>,
    fired: AtomicBool,
}

impl TeardownGuard {
    pub fn new(inner: Arc<dyn SessionTeardown>) -> Self {
        Self {
            inner,
            fired: AtomicBool::new(false),
        }
    }

    /// Run the teardown hook if it has not run yet
    pub fn trigger(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            debug!("session teardown already performed, ignoring");
            return;
        }
        warn!("session expired, tearing down");
        self.inner.teardown();
    }

    /// Whether the teardown hook has run
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for TeardownGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeardownGuard")
            .field("fired", &self.has_fired())
            .finish()
    }
}
