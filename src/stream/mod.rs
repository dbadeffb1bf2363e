//! Reconnecting stream client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dashboard consumes two push feeds: the backend's duplex WebSocket
//! (full snapshots) and a topic relay (per-metric deltas). Each runs in its
//! own `ReconnectingClient`, which owns the connection lifecycle and forwards
//! decoded messages to the ingest task over an mpsc channel.
//!
//! DESIGN
//! ======
//! One spawned task per connection. Every await point that can block (connect,
//! read, backoff sleep) is raced against two `watch` signals: the client's own
//! shutdown flag (set by `disconnect`) and the shared hard-stop flag. Nothing
//! outlives `disconnect()`.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures never escape. They show up as `StreamConnection`
//! state and `last_error`, published through a `watch` channel. Messages that
//! fail to decode are logged and skipped without dropping the connection.

pub mod backoff;
pub mod feeds;
pub mod transport;


use std::sync::Arc;

use serde::Serialize;
use telemetry::{Inbound, decode_message};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use backoff::ReconnectPolicy;
use transport::{Connector, Link};

/// Hello sent on the duplex feed to request a full snapshot.
pub const STATUS_REQUEST: &str = r#"{"type":"get_status"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Reconnecting,
}

/// Observable connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamConnection {
    pub state: ConnectionState,
    /// Reconnects scheduled since the last successful open.
    pub attempt: u32,
    pub last_error: Option<String>,
}

impl Default for StreamConnection {
    fn default() -> Self {
        Self { state: ConnectionState::Closed, attempt: 0, last_error: None }
    }
}

/// Static settings of one feed.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Label used in logs.
    pub name: &'static str,
    /// Sent right after every successful open.
    pub hello: Option<String>,
    pub policy: ReconnectPolicy,
}

pub struct ReconnectingClient {
    connector: Arc<dyn Connector>,
    options: StreamOptions,
    status: watch::Sender<StreamConnection>,
    hard_stop: watch::Receiver<bool>,
    running: Option<Running>,
}

struct Running {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReconnectingClient {
    pub fn new(connector: Arc<dyn Connector>, options: StreamOptions, hard_stop: watch::Receiver<bool>) -> Self {
        let (status, _) = watch::channel(StreamConnection::default());
        Self { connector, options, status, hard_stop, running: None }
    }

    /// Observe connection state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StreamConnection> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn status(&self) -> StreamConnection {
        self.status.borrow().clone()
    }

    /// Start (or restart) the connection task. Decoded messages go to `sink`.
    ///
    /// Refused while the hard stop is engaged: the client stays Closed.
    pub fn connect(&mut self, url: impl Into<String>, sink: mpsc::Sender<Inbound>) {
        self.disconnect();
        if *self.hard_stop.borrow() {
            warn!(stream = self.options.name, "hard stop engaged; not connecting");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let session = Session {
            connector: Arc::clone(&self.connector),
            url: url.into(),
            options: self.options.clone(),
            status: self.status.clone(),
            sink,
            shutdown: shutdown_rx,
            hard_stop: self.hard_stop.clone(),
        };
        let task = tokio::spawn(session.run());
        self.running = Some(Running { shutdown, task });
    }

    /// Stop the connection task and any pending reconnect. Idempotent.
    ///
    /// Leaves a clean Closed status: no attempt count, no stale error.
    pub fn disconnect(&mut self) {
        if let Some(running) = self.running.take() {
            running.shutdown.send_replace(true);
            running.task.abort();
        }
        self.status.send_replace(StreamConnection::default());
    }
}

impl Drop for ReconnectingClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// =============================================================================
// CONNECTION TASK
// =============================================================================

enum SessionEnd {
    /// Shutdown, hard stop, or the consumer went away.
    Stop,
    /// The link dropped; carries the transport error if there was one.
    Dropped(Option<String>),
}

struct Session {
    connector: Arc<dyn Connector>,
    url: String,
    options: StreamOptions,
    status: watch::Sender<StreamConnection>,
    sink: mpsc::Sender<Inbound>,
    shutdown: watch::Receiver<bool>,
    hard_stop: watch::Receiver<bool>,
}

impl Session {
    async fn run(mut self) {
        let name = self.options.name;
        let mut attempt: u32 = 0;
        let mut last_error: Option<String> = None;

        loop {
            let state = if attempt == 0 { ConnectionState::Connecting } else { ConnectionState::Reconnecting };
            self.publish(state, attempt, last_error.clone());

            let connected = tokio::select! {
                () = raised(&mut self.shutdown) => return self.close(attempt, last_error),
                () = raised(&mut self.hard_stop) => return self.close(attempt, last_error),
                result = self.connector.connect(&self.url) => result,
            };

            match connected {
                Ok(mut link) => {
                    attempt = 0;
                    last_error = None;
                    self.publish(ConnectionState::Open, 0, None);
                    info!(stream = name, url = %self.url, "stream connected");

                    match self.pump(link.as_mut()).await {
                        SessionEnd::Stop => {
                            link.close().await;
                            return self.close(attempt, last_error);
                        }
                        SessionEnd::Dropped(error) => {
                            warn!(stream = name, error = error.as_deref().unwrap_or("closed by peer"), "stream dropped");
                            last_error = error;
                        }
                    }
                }
                Err(e) => {
                    warn!(stream = name, error = %e, attempt, "stream connect failed");
                    last_error = Some(e.to_string());
                }
            }

            if !self.options.policy.allows(attempt) {
                warn!(stream = name, attempt, "reconnect attempts exhausted");
                return self.close(attempt, last_error);
            }
            let delay = self.options.policy.delay(attempt);
            attempt += 1;
            self.publish(ConnectionState::Reconnecting, attempt, last_error.clone());

            tokio::select! {
                () = raised(&mut self.shutdown) => return self.close(attempt, last_error),
                () = raised(&mut self.hard_stop) => return self.close(attempt, last_error),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Forward messages until the link ends or the session is told to stop.
    async fn pump(&mut self, link: &mut dyn Link) -> SessionEnd {
        if let Some(hello) = self.options.hello.clone() {
            if let Err(e) = link.send_text(hello).await {
                return SessionEnd::Dropped(Some(e.to_string()));
            }
        }

        loop {
            let received = tokio::select! {
                () = raised(&mut self.shutdown) => return SessionEnd::Stop,
                () = raised(&mut self.hard_stop) => return SessionEnd::Stop,
                received = link.recv_text() => received,
            };

            let text = match received {
                Ok(Some(text)) => text,
                Ok(None) => return SessionEnd::Dropped(None),
                Err(e) => return SessionEnd::Dropped(Some(e.to_string())),
            };

            match decode_message(&text) {
                Ok(Inbound::Ignored) => {}
                Ok(inbound) => {
                    if self.sink.send(inbound).await.is_err() {
                        info!(stream = self.options.name, "consumer gone; stopping stream");
                        return SessionEnd::Stop;
                    }
                }
                Err(e) => warn!(stream = self.options.name, error = %e, "dropping undecodable message"),
            }
        }
    }

    fn publish(&self, state: ConnectionState, attempt: u32, last_error: Option<String>) {
        self.status.send_replace(StreamConnection { state, attempt, last_error });
    }

    fn close(&self, attempt: u32, last_error: Option<String>) {
        self.publish(ConnectionState::Closed, attempt, last_error);
    }
}

/// Resolve once the flag reads `true`. Never resolves if the sender is gone.
pub(crate) async fn raised(flag: &mut watch::Receiver<bool>) {
    if flag.wait_for(|on| *on).await.is_err() {
        std::future::pending::<()>().await;
    }
}
