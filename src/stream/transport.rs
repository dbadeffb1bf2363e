//! Transport seam for the stream client.
//!
//! The reconnect loop only needs "open a link" and "read/write text on it".
//! `WsConnector` provides that over `tokio-tungstenite`; tests substitute
//! scripted links.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

/// Error surfaced by a transport. Only ever reported as connection state.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(error))
    }
}

/// Opens links to a URL.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Link>, StreamError>;
}

/// One open duplex text connection.
#[async_trait]
pub trait Link: Send {
    async fn send_text(&mut self, text: String) -> Result<(), StreamError>;

    /// Next text message, or `Ok(None)` once the peer has closed.
    ///
    /// Frames that carry no usable text are skipped; only transport failures
    /// are errors.
    async fn recv_text(&mut self) -> Result<Option<String>, StreamError>;

    /// Close politely. Errors are ignored; the link is dropped either way.
    async fn close(&mut self);
}

// =============================================================================
// WEBSOCKET
// =============================================================================

pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Link>, StreamError> {
        let (ws, _) = connect_async(url).await?;
        Ok(Box::new(WsLink { ws }))
    }
}

struct WsLink {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Link for WsLink {
    async fn send_text(&mut self, text: String) -> Result<(), StreamError> {
        self.ws.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn recv_text(&mut self) -> Result<Option<String>, StreamError> {
        // Pings are answered by tungstenite while reading.
        while let Some(message) = self.ws.next().await {
            match message? {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(e) => warn!(len = bytes.len(), error = %e, "skipping binary frame that is not UTF-8"),
                },
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!(error = %e, "websocket close failed");
        }
    }
}
