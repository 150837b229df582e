//! Common test utilities for jrmc-client integration tests
//!
//! A mock WebSocket server that hands every text frame to a closure and
//! sends back whatever the closure returns.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Mock WebSocket server for client testing
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    message_rx: mpsc::Receiver<String>,
}

impl MockWsServer {
    /// Start a mock server answering each frame with `handler(frame)`
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(String) -> Option<String> + Send + Sync + 'static,
    {
        Self::with_replies(move |text| handler(text).into_iter().collect()).await
    }

    /// Start a mock server that may send any number of frames per request
    pub async fn with_replies<F>(handler: F) -> Self
    where
        F: Fn(String) -> Vec<String> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (msg_tx, message_rx) = mpsc::channel::<String>(100);
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let msg_tx = msg_tx.clone();
                        let handler = handler.clone();

                        tokio::spawn(async move {
                            let Ok(ws_stream) = accept_async(stream).await else { return };
                            let (mut write, mut read) = ws_stream.split();

                            while let Some(Ok(msg)) = read.next().await {
                                match msg {
                                    Message::Text(text) => {
                                        let _ = msg_tx.send(text.clone()).await;
                                        for reply in handler(text) {
                                            let _ = write.send(Message::Text(reply)).await;
                                        }
                                    }
                                    Message::Close(_) => break,
                                    _ => {}
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            message_rx,
        }
    }

    /// Mock server that answers every request with `result`
    pub async fn answering(result: Value) -> Self {
        Self::with_handler(move |text| {
            let request: Value = serde_json::from_str(&text).ok()?;
            Some(json!({"id": request["id"], "result": result}).to_string())
        })
        .await
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Next frame the server received
    pub async fn next_message(&mut self) -> Option<String> {
        tokio::time::timeout(std::time::Duration::from_secs(2), self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Success envelope for request `id`
pub fn mock_response(id: &Value, result: Value) -> String {
    json!({"id": id, "result": result}).to_string()
}

/// Error envelope for request `id`
pub fn mock_error_response(id: &Value, message: &str) -> String {
    json!({"id": id, "error": message}).to_string()
}
