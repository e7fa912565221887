//! Notification stream client
//!
//! Manages one logical SSE connection to the notification feed. The
//! connection is established with a bounded startup timeout, read
//! incrementally, and reconnected with capped exponential backoff; callers
//! observe only a connection status signal, never raw stream errors.
//!
//! Cancellation is generation-based: every `start()` and `cancel()` bumps a
//! shared counter, and a connection task compares the generation it was
//! spawned with against the current one at every resume point. A stale task
//! makes no state changes and never schedules a reconnect, so an error
//! arriving after cancellation is a no-op by construction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::Utc;
use futures_util::StreamExt;
use reqwest::{header, StatusCode};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{AuthGateway, TeardownGuard, TokenStore};
use crate::config::ClientConfig;
use crate::error::{ApiError, StreamError};
use crate::notifications::backoff::Backoff;
use crate::notifications::event::{NotificationEvent, NotificationList};
use crate::notifications::parser::FrameParser;

/// Path of the SSE subscription endpoint
pub const SUBSCRIBE_PATH: &str = "/v1/notifications/subscribe";

/// Externally visible stream state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection and none wanted
    Disconnected,
    /// A connection attempt is in progress
    Connecting,
    /// Frames are being received
    Connected,
    /// Last attempt failed; a backoff reconnect is pending
    Error,
    /// Retry budget exhausted; only a manual `start()` will try again
    Failed,
}

/// SSE notification stream with automatic reconnection
pub struct NotificationStream {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    tokens: Arc<TokenStore>,
    auth: Arc<AuthGateway>,
    teardown: Arc<TeardownGuard>,
    list: Arc<StdMutex<NotificationList>>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    event_tx: mpsc::UnboundedSender<NotificationEvent>,
    event_rx: StdMutex<Option<mpsc::UnboundedReceiver<NotificationEvent>>>,
    generation: Arc<AtomicU64>,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

impl NotificationStream {
    pub fn new(
        http: reqwest::Client,
        config: Arc<ClientConfig>,
        tokens: Arc<TokenStore>,
        auth: Arc<AuthGateway>,
        teardown: Arc<TeardownGuard>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            http,
            config,
            tokens,
            auth,
            teardown,
            list: Arc::new(StdMutex::new(NotificationList::new())),
            status: Arc::new(status),
            event_tx,
            event_rx: StdMutex::new(Some(event_rx)),
            generation: Arc::new(AtomicU64::new(0)),
            handle: StdMutex::new(None),
        }
    }

    /// Open the stream, replacing any live connection
    ///
    /// Reads the current token, refreshing once if none is stored; fails
    /// with [`StreamError::Unauthenticated`] (state stays `Disconnected`)
    /// when that refresh is rejected. On success the connection task starts
    /// with its attempt counter at zero, so a manual restart after a
    /// terminal `Failed` gets a full retry budget again.
    pub async fn start(&self) -> Result<(), StreamError> {
        // Supersede any live connection before opening a new one.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = self.take_handle() {
            handle.abort();
        }

        if self.tokens.get().is_none() {
            debug!("no access token, refreshing before opening the stream");
            if let Err(err) = self.auth.refresh().await {
                warn!("cannot open notification stream: {}", err);
                self.status.send_replace(ConnectionStatus::Disconnected);
                return Err(StreamError::Unauthenticated);
            }
        }

        self.status.send_replace(ConnectionStatus::Connecting);
        let worker = ConnectionTask {
            http: self.http.clone(),
            config: Arc::clone(&self.config),
            tokens: Arc::clone(&self.tokens),
            auth: Arc::clone(&self.auth),
            teardown: Arc::clone(&self.teardown),
            list: Arc::clone(&self.list),
            status: Arc::clone(&self.status),
            event_tx: self.event_tx.clone(),
            backoff: Backoff::from_config(&self.config),
            generation,
            current: Arc::clone(&self.generation),
        };
        let handle = tokio::spawn(worker.run());
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Close the stream and suppress any pending reconnection
    ///
    /// Idempotent; dropping the stream behaves the same way.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.take_handle() {
            handle.abort();
        }
        self.status.send_replace(ConnectionStatus::Disconnected);
    }

    /// Current connection status
    pub fn connection_status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Watch channel following status transitions
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Receiver delivering each event as it is parsed; yields `Some` only
    /// on the first call
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<NotificationEvent>> {
        self.event_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Snapshot of received notifications, newest first
    pub fn notifications(&self) -> Vec<NotificationEvent> {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Mark one notification read
    pub fn mark_read(&self, id: &str) -> bool {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_read(id)
    }

    /// Mark every notification read
    pub fn mark_all_read(&self) {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_all_read();
    }

    /// Remove one notification
    pub fn remove(&self, id: &str) -> bool {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Number of unread notifications
    pub fn unread_count(&self) -> usize {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unread_count()
    }

    fn take_handle(&self) -> Option<JoinHandle<()>> {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        // Unmount must behave like an explicit cancel.
        self.cancel();
    }
}

impl std::fmt::Debug for NotificationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationStream")
            .field("status", &self.connection_status())
            .finish()
    }
}

/// Outcome of a single connection attempt
enum AttemptOutcome {
    /// The attempt was superseded or cancelled; exit without state changes
    Cancelled,
    /// The subscribe endpoint rejected the token
    AuthRejected,
    /// Timeout, transport failure, non-2xx status or server close
    Failed,
}

/// The spawned connection loop for one `start()` call
struct ConnectionTask {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    tokens: Arc<TokenStore>,
    auth: Arc<AuthGateway>,
    teardown: Arc<TeardownGuard>,
    list: Arc<StdMutex<NotificationList>>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    event_tx: mpsc::UnboundedSender<NotificationEvent>,
    backoff: Backoff,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl ConnectionTask {
    /// Whether this task still owns the stream
    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    fn set_status(&self, status: ConnectionStatus) {
        if self.is_current() {
            self.status.send_replace(status);
        }
    }

    async fn run(self) {
        let mut attempt: u32 = 0;
        loop {
            if !self.is_current() {
                return;
            }
            self.set_status(ConnectionStatus::Connecting);

            match self.connect_and_read(&mut attempt).await {
                AttemptOutcome::Cancelled => return,
                AttemptOutcome::AuthRejected => {
                    info!("notification stream unauthorized, refreshing token");
                    match self.auth.refresh().await {
                        Ok(_) => {}
                        Err(ApiError::AuthExpired) => {
                            if self.is_current() {
                                warn!("token refresh rejected, stream cannot recover");
                                self.set_status(ConnectionStatus::Failed);
                                self.teardown.trigger();
                            }
                            return;
                        }
                        Err(err) => {
                            warn!("token refresh failed: {}", err);
                        }
                    }
                }
                AttemptOutcome::Failed => {}
            }

            if !self.is_current() {
                return;
            }
            attempt += 1;
            if attempt >= self.config.max_retries {
                warn!(
                    "notification stream giving up after {} failed attempts",
                    attempt
                );
                self.set_status(ConnectionStatus::Failed);
                return;
            }

            self.set_status(ConnectionStatus::Error);
            let delay = self.backoff.delay(attempt - 1);
            debug!("reconnecting notification stream in {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect_and_read(&self, attempt: &mut u32) -> AttemptOutcome {
        let url = self.config.api_url(SUBSCRIBE_PATH);
        let mut request = self
            .http
            .get(&url)
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache");
        // Read the token lazily so a refresh completed by the REST path is
        // picked up here as well.
        if let Some(token) = self.tokens.get() {
            request = request.bearer_auth(token);
        }

        let response = match tokio::time::timeout(self.config.connect_timeout, request.send()).await
        {
            Err(_) => {
                warn!("notification stream connection timed out");
                return AttemptOutcome::Failed;
            }
            Ok(Err(err)) => {
                warn!("notification stream connection failed: {}", err);
                return AttemptOutcome::Failed;
            }
            Ok(Ok(response)) => response,
        };
        if !self.is_current() {
            return AttemptOutcome::Cancelled;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return AttemptOutcome::AuthRejected;
        }
        if !status.is_success() {
            warn!("notification stream rejected with status {}", status);
            return AttemptOutcome::Failed;
        }

        info!("notification stream connected");
        self.set_status(ConnectionStatus::Connected);
        *attempt = 0;

        let mut stream = response.bytes_stream();
        let mut parser = FrameParser::new();
        loop {
            match stream.next().await {
                Some(Ok(chunk)) => {
                    if !self.is_current() {
                        return AttemptOutcome::Cancelled;
                    }
                    let now = Utc::now();
                    for payload in parser.feed(&chunk) {
                        let event = NotificationEvent::from_payload(payload, now);
                        debug!("notification received: {}", event.id);
                        self.list
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push_front(event.clone());
                        let _ = self.event_tx.send(event);
                    }
                }
                Some(Err(err)) => {
                    if !self.is_current() {
                        return AttemptOutcome::Cancelled;
                    }
                    warn!("notification stream read error: {}", err);
                    return AttemptOutcome::Failed;
                }
                None => {
                    if !self.is_current() {
                        return AttemptOutcome::Cancelled;
                    }
                    warn!("notification stream closed by server");
                    return AttemptOutcome::Failed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoopTeardown;

    fn stream_for_test() -> NotificationStream {
        let config = Arc::new(
            ClientConfig::builder()
                .base_url("http://127.0.0.1:1")
                .build()
                .unwrap(),
        );
        let tokens = Arc::new(TokenStore::new());
        let http = reqwest::Client::new();
        let auth = Arc::new(AuthGateway::new(http.clone(), &config, Arc::clone(&tokens)));
        let teardown = Arc::new(TeardownGuard::new(Arc::new(NoopTeardown)));
        NotificationStream::new(http, config, tokens, auth, teardown)
    }

    #[test]
    fn test_initial_state() {
        let stream = stream_for_test();
        assert_eq!(stream.connection_status(), ConnectionStatus::Disconnected);
        assert!(stream.notifications().is_empty());
        assert_eq!(stream.unread_count(), 0);
    }

    #[test]
    fn test_take_events_only_once() {
        let stream = stream_for_test();
        assert!(stream.take_events().is_some());
        assert!(stream.take_events().is_none());
    }

    #[tokio::test]
    async fn test_cancel_without_start_is_noop() {
        let stream = stream_for_test();
        stream.cancel();
        stream.cancel();
        assert_eq!(stream.connection_status(), ConnectionStatus::Disconnected);
    }
}
