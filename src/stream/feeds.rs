//! The process's live feeds.
//!
//! A feed that gave up after its reconnect budget, or was closed by the hard
//! stop, stays Closed until someone connects it again. `Feeds` keeps each
//! client next to its URL and the shared ingest queue so HTTP handlers can do
//! that without knowing how the process was wired.

#[cfg(test)]
#[path = "feeds_test.rs"]
mod feeds_test;

use std::sync::{Mutex, MutexGuard, PoisonError};

use telemetry::Inbound;
use tokio::sync::{mpsc, watch};
use tracing::info;

use super::{ReconnectingClient, StreamConnection};

/// A client bound to the URL it connects to.
pub struct Feed {
    url: String,
    client: Mutex<ReconnectingClient>,
}

impl Feed {
    #[must_use]
    pub fn new(client: ReconnectingClient, url: impl Into<String>) -> Self {
        Self { url: url.into(), client: Mutex::new(client) }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn status(&self) -> StreamConnection {
        self.lock().status()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StreamConnection> {
        self.lock().subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, ReconnectingClient> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Backend feed plus the optional topic relay, sharing one ingest queue.
pub struct Feeds {
    backend: Feed,
    relay: Option<Feed>,
    sink: mpsc::Sender<Inbound>,
}

impl Feeds {
    #[must_use]
    pub fn new(backend: Feed, relay: Option<Feed>, sink: mpsc::Sender<Inbound>) -> Self {
        Self { backend, relay, sink }
    }

    #[must_use]
    pub fn backend(&self) -> &Feed {
        &self.backend
    }

    #[must_use]
    pub fn relay(&self) -> Option<&Feed> {
        self.relay.as_ref()
    }

    /// (Re)start every feed with a fresh attempt counter.
    ///
    /// A client refuses while the hard stop is engaged and stays Closed.
    pub fn connect(&self) {
        for feed in self.iter() {
            info!(url = %feed.url, "connecting feed");
            feed.lock().connect(feed.url.clone(), self.sink.clone());
        }
    }

    pub fn disconnect(&self) {
        for feed in self.iter() {
            feed.lock().disconnect();
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Feed> {
        std::iter::once(&self.backend).chain(self.relay.as_ref())
    }
}
