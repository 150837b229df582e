//! JSON-RMC client over WebSocket
//!
//! `JrmcClient` sends request envelopes and waits for the matching response.
//! Ids are assigned by the client, so callers only name the resource, the
//! method and the params.
//!
//! # Cloning
//!
//! `JrmcClient` is cheaply cloneable; all clones share one connection and
//! can call concurrently from different tasks.

use crate::request::RequestManager;
use futures::{SinkExt, StreamExt};
use jrmc_core::{codec, Error, Outcome, Request, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsSink = futures::stream::SplitSink<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>, Message>;
type WsSource = futures::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// JSON-RMC client over WebSocket
#[derive(Clone)]
pub struct JrmcClient {
    sender: Arc<Mutex<WsSink>>,
    request_manager: RequestManager,
    timeout: Option<Duration>,
}

impl JrmcClient {
    /// Connect to a JSON-RMC server
    #[tracing::instrument(skip(url), fields(url = url))]
    pub async fn connect(url: &str) -> Result<Self> {
        tracing::info!("Connecting to server");
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;

        let (sender, receiver) = ws_stream.split();
        let request_manager = RequestManager::new();

        tokio::spawn(Self::receive_loop(receiver, request_manager.clone()));
        tracing::info!("Connected successfully");

        Ok(Self {
            sender: Arc::new(Mutex::new(sender)),
            request_manager,
            timeout: None,
        })
    }

    /// Give up on calls that are not answered within `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Call `method` on the node at `resource` with positional `params`
    ///
    /// An `error` envelope from the server becomes [`Error::Remote`] holding
    /// the server's message unchanged.
    #[tracing::instrument(skip_all, fields(resource = %resource, method = %method))]
    pub async fn call(&self, resource: &str, method: &str, params: Vec<Value>) -> Result<Value> {
        let start = std::time::Instant::now();
        let id = self.request_manager.next_id();
        let request = Request::new(resource, method, params).with_id(Value::from(id));

        let rx = self.request_manager.register(id).await;

        let request_text = codec::encode_request(&request)?;
        if let Err(e) = self
            .sender
            .lock()
            .await
            .send(Message::Text(request_text))
            .await
        {
            self.request_manager.forget(id).await;
            return Err(Error::WebSocket(e.to_string()));
        }

        tracing::debug!(id = id, "Request sent, waiting for response");

        let received = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    self.request_manager.forget(id).await;
                    return Err(Error::Timeout);
                }
            },
            None => rx.await,
        };
        let response = received.map_err(|_| Error::Internal("Request channel closed".to_string()))??;

        let duration = start.elapsed().as_secs_f64();
        match response.outcome {
            Outcome::Result(value) => {
                tracing::debug!(duration_secs = duration, "Call completed");
                Ok(value)
            }
            Outcome::Error(message) => {
                tracing::debug!(duration_secs = duration, error = %message, "Call failed");
                Err(Error::Remote(message))
            }
        }
    }

    /// [`call`](Self::call) with typed params and result
    ///
    /// `params` must serialize to a JSON array; tuples do, `(10,)` for one
    /// argument.
    pub async fn call_typed<P, R>(&self, resource: &str, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = match serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))? {
            Value::Array(params) => params,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        let result = self.call(resource, method, params).await?;
        serde_json::from_value(result).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Number of calls still waiting for a response
    pub async fn pending_calls(&self) -> usize {
        self.request_manager.pending_count().await
    }

    /// Close the connection
    pub async fn disconnect(&self) {
        let mut sender = self.sender.lock().await;
        if let Err(e) = sender.send(Message::Close(None)).await {
            tracing::debug!(error = %e, "Close frame not sent");
        }
        let _ = sender.close().await;
        tracing::info!("Disconnected");
    }

    async fn receive_loop(mut receiver: WsSource, request_manager: RequestManager) {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => match codec::decode_response(&text) {
                    Ok(response) => request_manager.complete(response).await,
                    Err(e) => tracing::error!(error = %e, "Error handling message"),
                },
                Ok(Message::Close(_)) => {
                    tracing::info!("Connection closed by server");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "WebSocket error");
                    break;
                }
            }
        }

        request_manager.fail_all(Error::ConnectionClosed).await;
    }
}

impl std::fmt::Debug for JrmcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JrmcClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
