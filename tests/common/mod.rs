//! Shared helpers for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use agora_client::auth::SessionTeardown;
use agora_client::notifications::ConnectionStatus;
use agora_client::{AgoraClient, ClientConfig};

/// Teardown hook that counts how often it was invoked
#[derive(Debug, Default)]
pub struct RecordingTeardown {
    calls: AtomicUsize,
}

impl RecordingTeardown {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionTeardown for RecordingTeardown {
    fn teardown(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Configuration with short, deterministic delays for tests
pub fn fast_config(base_url: &str, max_retries: u32, backoff_base: Duration) -> ClientConfig {
    ClientConfig::builder()
        .base_url(base_url)
        .connect_timeout(Duration::from_secs(2))
        .max_retries(max_retries)
        .backoff_base(backoff_base)
        .backoff_max(Duration::from_millis(500))
        .backoff_jitter_max(Duration::ZERO)
        .build()
        .expect("test config is valid")
}

/// Build a client against a mock server, returning the teardown counter
pub fn client_against(
    server_uri: &str,
    max_retries: u32,
    backoff_base: Duration,
) -> (AgoraClient, Arc<RecordingTeardown>) {
    let teardown = Arc::new(RecordingTeardown::default());
    let config = fast_config(server_uri, max_retries, backoff_base);
    let client = AgoraClient::new(config, Arc::clone(&teardown) as Arc<dyn SessionTeardown>)
        .expect("client builds");
    (client, teardown)
}

/// Wait until the status channel reports `want`, or panic after `timeout`
///
/// Only suitable for statuses that persist (Error during a backoff wait,
/// terminal Failed, Disconnected); transient states may be overwritten
/// before the watcher polls.
pub async fn wait_for_status(
    rx: &mut watch::Receiver<ConnectionStatus>,
    want: ConnectionStatus,
    timeout: Duration,
) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if *rx.borrow_and_update() == want {
            return;
        }
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            panic!("timed out waiting for status {:?}", want);
        }
        match tokio::time::timeout(remaining, rx.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => panic!("status channel closed"),
            Err(_) => panic!("timed out waiting for status {:?}", want),
        }
    }
}

/// A single SSE frame carrying a notification payload
pub fn sse_frame(id: &str, text: &str) -> String {
    format!("data: {{\"id\":\"{}\",\"text\":\"{}\"}}\n\n", id, text)
}
