//! Request tracking for the JSON-RMC client
//!
//! Every call gets a numeric id and a oneshot channel. The receive loop
//! completes the channel when a response with that id arrives; responses may
//! arrive in any order.
//!
//! # Request Lifecycle
//!
//! 1. **Generate ID**: next value of a per-client counter
//! 2. **Register**: store the oneshot sender under the id
//! 3. **Send**: write the request frame
//! 4. **Complete**: the receive loop matches the response id and sends it
//! 5. **Fail**: on disconnect every pending call gets `ConnectionClosed`

use jrmc_core::{Error, Response, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

type Pending = oneshot::Sender<Result<Response>>;

/// Tracks calls waiting for their response
#[derive(Clone)]
pub struct RequestManager {
    pending: Arc<Mutex<HashMap<u64, Pending>>>,
    counter: Arc<AtomicU64>,
}

impl RequestManager {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Generate a new unique request id
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Register a call and get the receiver its response will arrive on
    pub async fn register(&self, id: u64) -> oneshot::Receiver<Result<Response>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);
        rx
    }

    /// Route a response to the call that is waiting for it
    ///
    /// Responses whose id is not one of ours are logged and dropped.
    pub async fn complete(&self, response: Response) {
        let Some(id) = response.id.as_ref().and_then(Value::as_u64) else {
            tracing::warn!(id = ?response.id, "Response without a client request id");
            return;
        };

        match self.pending.lock().await.remove(&id) {
            Some(tx) => {
                let _ = tx.send(Ok(response));
            }
            None => tracing::warn!(id = id, "Response for unknown request"),
        }
    }

    /// Stop waiting for `id`
    pub async fn forget(&self, id: u64) {
        self.pending.lock().await.remove(&id);
    }

    /// Fail all pending calls
    pub async fn fail_all(&self, error: Error) {
        let mut pending = self.pending.lock().await;
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(error.clone()));
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_are_unique() {
        let manager = RequestManager::new();
        let id1 = manager.next_id();
        let id2 = manager.next_id();
        assert_ne!(id1, id2);
    }

    #[tokio::test]
    async fn test_register_and_complete() {
        let manager = RequestManager::new();
        let id = manager.next_id();

        let rx = manager.register(id).await;
        assert_eq!(manager.pending_count().await, 1);

        let response = Response::success(Some(json!(id)), json!(42));
        manager.complete(response.clone()).await;

        assert_eq!(manager.pending_count().await, 0);
        assert_eq!(rx.await.unwrap().unwrap(), response);
    }

    #[tokio::test]
    async fn test_complete_ignores_foreign_ids() {
        let manager = RequestManager::new();
        let _rx = manager.register(1).await;

        manager.complete(Response::success(Some(json!("x")), json!(1))).await;
        manager.complete(Response::success(None, json!(1))).await;
        manager.complete(Response::success(Some(json!(99)), json!(1))).await;

        assert_eq!(manager.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_fail_all() {
        let manager = RequestManager::new();
        let rx1 = manager.register(1).await;
        let rx2 = manager.register(2).await;

        manager.fail_all(Error::ConnectionClosed).await;

        assert!(matches!(rx1.await.unwrap(), Err(Error::ConnectionClosed)));
        assert!(matches!(rx2.await.unwrap(), Err(Error::ConnectionClosed)));
        assert_eq!(manager.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_forget() {
        let manager = RequestManager::new();
        let rx = manager.register(5).await;
        manager.forget(5).await;
        assert_eq!(manager.pending_count().await, 0);
        assert!(rx.await.is_err());
    }
}
