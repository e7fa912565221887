//! Notification streaming
//!
//! One logical SSE connection at a time: established with a bounded startup
//! timeout, parsed incrementally, and reconnected with capped exponential
//! backoff. Parsed events land in an in-memory newest-first list.

pub mod backoff;
pub mod event;
pub mod parser;
pub mod stream;

pub use backoff::Backoff;
pub use event::{NotificationEvent, NotificationList, NotificationPayload};
pub use parser::FrameParser;
pub use stream::{ConnectionStatus, NotificationStream, SUBSCRIBE_PATH};
