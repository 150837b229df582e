//! WebSocket connection handling
//!
//! Each accepted TCP stream is upgraded to a WebSocket and served by two
//! tasks:
//!
//! - **Receive task**: reads text frames; every frame is one request
//! - **Send task**: writes responses from a channel to the socket
//!
//! Every request is dispatched on the blocking pool (dispatch is synchronous
//! and a method may block), so a slow call never stalls the frames behind it.
//! Responses can therefore arrive out of order; clients correlate them by id.
//!
//! A frame that is not JSON cannot be answered with an envelope and is only
//! logged. When a call timeout is configured, a call that misses it is
//! answered with `Request timeout` while the method keeps running to
//! completion on its worker thread.

use crate::dispatch::Dispatcher;
use crate::validator::request_id;
use futures::{SinkExt, StreamExt};
use jrmc_core::{codec, Error, Response, Result};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Serve one connection until either side closes it
#[tracing::instrument(skip(stream, dispatcher, call_timeout, active), fields(conn_id = conn_id))]
pub async fn handle_connection(
    stream: TcpStream,
    conn_id: u64,
    dispatcher: Dispatcher,
    call_timeout: Option<Duration>,
    active: Arc<AtomicI64>,
) -> Result<()> {
    tracing::debug!("Upgrading connection to WebSocket");
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))?;

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    record_active(&dispatcher, active.fetch_add(1, Ordering::SeqCst) + 1);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                tracing::error!(error = %e, "Error sending message");
                break;
            }
        }
    });

    let recv_dispatcher = dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let dispatcher = recv_dispatcher.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_message(&text, dispatcher, call_timeout, &tx).await {
                            tracing::warn!(error = %e, "Error handling message");
                        }
                    });
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Connection closed by client");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    record_active(&dispatcher, active.fetch_sub(1, Ordering::SeqCst) - 1);
    tracing::info!("Connection cleaned up");

    Ok(())
}

fn record_active(dispatcher: &Dispatcher, active: i64) {
    if let Some(metrics) = dispatcher.metrics() {
        metrics.record_connection(active);
    }
}

/// Answer one text frame
async fn handle_message(
    text: &str,
    dispatcher: Dispatcher,
    call_timeout: Option<Duration>,
    tx: &mpsc::UnboundedSender<Message>,
) -> Result<()> {
    let request = codec::decode(text)?;
    let response = process_request(request, dispatcher, call_timeout).await;
    let response_text = codec::encode_response(&response)?;
    tx.send(Message::Text(response_text))
        .map_err(|_| Error::ConnectionClosed)
}

/// Dispatch a decoded request off the async runtime, bounded by
/// `call_timeout` when one is set
pub async fn process_request(
    request: Value,
    dispatcher: Dispatcher,
    call_timeout: Option<Duration>,
) -> Response {
    let id = request_id(&request);
    let task = tokio::task::spawn_blocking(move || dispatcher.dispatch(request));

    let joined = match call_timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(timeout = ?limit, "Call timed out");
                return Response::error(id, Error::Timeout.to_string());
            }
        },
        None => task.await,
    };

    joined.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Dispatch task failed");
        Response::error(id, Error::Internal(e.to_string()).to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{from_fn, from_typed_fn};
    use crate::tree::Resource;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            Resource::new()
                .with_method("triple", from_typed_fn(|(x,): (i64,)| Ok::<_, String>(3 * x)))
                .with_method(
                    "sleep",
                    from_fn(|_| {
                        std::thread::sleep(Duration::from_millis(300));
                        Ok(json!("awake"))
                    }),
                ),
        )
    }

    #[tokio::test]
    async fn test_process_request() {
        let response = process_request(
            json!({"id": 1, "resource": "/", "method": "triple", "params": [5]}),
            dispatcher(),
            None,
        )
        .await;
        assert_eq!(response.into_value(), json!({"id": 1, "result": 15}));
    }

    #[tokio::test]
    async fn test_process_request_within_timeout() {
        let response = process_request(
            json!({"id": 2, "resource": "/", "method": "triple", "params": [1]}),
            dispatcher(),
            Some(Duration::from_secs(5)),
        )
        .await;
        assert_eq!(response.result(), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_process_request_timeout_keeps_id() {
        let response = process_request(
            json!({"id": "slow", "resource": "/", "method": "sleep"}),
            dispatcher(),
            Some(Duration::from_millis(20)),
        )
        .await;
        assert_eq!(
            response.into_value(),
            json!({"id": "slow", "error": "Request timeout"})
        );
    }

    #[tokio::test]
    async fn test_handle_message_sends_response() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle_message(
            r#"{"id":3,"resource":"/nope","method":"x"}"#,
            dispatcher(),
            None,
            &tx,
        )
        .await
        .unwrap();

        match rx.recv().await {
            Some(Message::Text(text)) => {
                assert_eq!(text, r#"{"id":3,"error":"Resource not found: /nope"}"#)
            }
            other => panic!("Expected text frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_message_drops_undecodable_frame() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = handle_message("{oops", dispatcher(), None, &tx).await;
        assert!(matches!(result, Err(Error::Parse(_))));
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}
