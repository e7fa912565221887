//! Authentication support
//!
//! Holds the process-wide access token, the refresh gateway that renews it,
//! and the session teardown seam invoked on unrecoverable auth failure.

pub mod gateway;
pub mod store;
pub mod teardown;

pub use gateway::{AuthGateway, REFRESH_PATH};
pub use store::TokenStore;
pub use teardown::{NoopTeardown, SessionTeardown, TeardownGuard};
