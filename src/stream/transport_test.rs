use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use telemetry::Inbound;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use super::*;
use crate::stream::backoff::ReconnectPolicy;
use crate::stream::{ConnectionState, ReconnectingClient, StreamOptions};

/// Local WebSocket peer that sends `frames` on every accepted connection and
/// then stays open. Returns its URL and an accept counter.
async fn serve_frames(frames: Vec<Message>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepts);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let frames = frames.clone();
            tokio::spawn(async move {
                let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                for frame in frames {
                    if ws.send(frame).await.is_err() {
                        return;
                    }
                }
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });
    (format!("ws://{addr}"), accepts)
}

#[tokio::test]
async fn ws_link_reads_text_and_utf8_binary() {
    let (url, _) = serve_frames(vec![
        Message::Text(r#"{"robots": {}}"#.to_owned().into()),
        Message::Binary(br#"{"type": "pong"}"#.to_vec().into()),
    ])
    .await;

    let mut link = WsConnector.connect(&url).await.unwrap();

    assert_eq!(link.recv_text().await.unwrap().as_deref(), Some(r#"{"robots": {}}"#));
    assert_eq!(link.recv_text().await.unwrap().as_deref(), Some(r#"{"type": "pong"}"#));
    link.close().await;
}

#[tokio::test]
async fn non_utf8_binary_frame_is_skipped_without_reconnecting() {
    let (url, accepts) = serve_frames(vec![
        Message::Binary(vec![0xff, 0xfe, 0x00].into()),
        Message::Text(r#"{"robots": {"robot_001": {"battery": 80}}}"#.to_owned().into()),
    ])
    .await;
    let (_hard_tx, hard_rx) = watch::channel(false);
    let policy = ReconnectPolicy { base: Duration::from_millis(1), cap: Duration::from_millis(4), max_attempts: 5 };
    let options = StreamOptions { name: "test", hello: None, policy };
    let mut client = ReconnectingClient::new(Arc::new(WsConnector), options, hard_rx);
    let (tx, mut rx) = mpsc::channel(8);

    client.connect(url, tx);

    let first = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(first, Inbound::Snapshot(_)));
    let status = client.status();
    assert_eq!(status.state, ConnectionState::Open);
    assert_eq!(status.attempt, 0);
    assert!(status.last_error.is_none());
    assert_eq!(accepts.load(Ordering::SeqCst), 1);
    client.disconnect();
}
