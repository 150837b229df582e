//! JSON-RMC dispatch engine and WebSocket server
//!
//! A JSON-RMC request names a resource path and a method. The engine walks a
//! tree of registered nodes to the target, checks that the method was
//! registered as exposed, calls it, and answers with a correlated envelope
//! carrying either a `result` or an `error`.
//!
//! # Core Features
//!
//! - **Resource tree**: nested namespaces and services behind one lookup
//!   trait, [`ResourceNode`]
//! - **Capability gate**: only methods registered with `expose` are callable
//! - **Sub-applications**: an [`Application`] mounted in the tree answers
//!   every call below its mount point
//! - **Failure capture**: method, application and hook errors and panics
//!   become error envelopes; captured panics are logged through `tracing`
//!   rather than printed to stderr
//! - **Hooks**: optional callbacks around each invocation
//! - **WebSocket transport**: one text frame per request, dispatched on the
//!   blocking pool with an optional per-call timeout
//! - **Observability**: `tracing` logs plus OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jrmc_server::{from_typed_fn, JrmcServer, Resource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let math = Resource::new()
//!         .with_method("triple", from_typed_fn(|(x,): (i64,)| Ok::<_, String>(3 * x)));
//!
//!     let addr: std::net::SocketAddr = "127.0.0.1:8080".parse()?;
//!     let server = JrmcServer::builder()
//!         .bind(addr)
//!         .root(Resource::new().with_child("math", math))
//!         .build()
//!         .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Embedding
//!
//! The engine does not need the server. [`dispatch`] takes a decoded request
//! and returns a [`Response`](jrmc_core::Response); [`handle_str`] does the
//! same for raw text:
//!
//! ```rust
//! use jrmc_server::{dispatch, from_fn, Resource};
//! use serde_json::json;
//!
//! let root = Resource::new()
//!     .with_child("math", Resource::new().with_private("secret", from_fn(|_| Ok(json!(0)))));
//!
//! let response = dispatch(&root, json!({"id": 4, "resource": "/math", "method": "secret"}));
//! assert_eq!(response.into_value(), json!({"id": 4, "error": "No such method: secret!"}));
//! ```

mod builder;
mod connection;
mod dispatch;
mod gate;
mod hooks;
mod invoker;
mod method;
mod metrics;
pub mod resolver;
mod response;
mod tree;
pub mod validator;

pub use builder::ServerBuilder;
pub use dispatch::{dispatch, dispatch_with, handle_str, Dispatcher};
pub use gate::gate;
pub use hooks::CallHooks;
pub use invoker::{install_panic_hook, invoke, invoke_app};
pub use method::{
    from_app_fn, from_fn, from_typed_fn, Application, FnApplication, FnMethod, Method, MethodResult,
};
pub use metrics::DispatchMetrics;
pub use resolver::{resolve, ResolvePolicy, Target};
pub use response::build as build_response;
pub use tree::{ApplicationNode, Member, Resource, ResourceNode};

use jrmc_core::Result;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// JSON-RMC server over WebSocket
///
/// # Lifecycle
///
/// 1. **Build**: create the server with `JrmcServer::builder()`
/// 2. **Run**: `server.run().await` accepts connections until the listener fails
///
/// Each connection runs in its own task and shares one [`Dispatcher`]. The
/// resource tree is read-only once the server is built.
pub struct JrmcServer {
    listener: TcpListener,
    dispatcher: Dispatcher,
    call_timeout: Option<Duration>,
    active_connections: Arc<AtomicI64>,
}

impl JrmcServer {
    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Accept connections and serve them until the listener fails
    #[tracing::instrument(skip(self), name = "server.run")]
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting JRMC server");
        let conn_counter = AtomicU64::new(0);

        loop {
            let (stream, addr) = self
                .listener
                .accept()
                .await
                .map_err(|e| jrmc_core::Error::Io(e.to_string()))?;
            let conn_id = conn_counter.fetch_add(1, Ordering::SeqCst);
            let dispatcher = self.dispatcher.clone();
            let call_timeout = self.call_timeout;
            let active = Arc::clone(&self.active_connections);

            tracing::info!(conn_id = conn_id, addr = %addr, "New connection accepted");

            tokio::spawn(async move {
                if let Err(e) =
                    connection::handle_connection(stream, conn_id, dispatcher, call_timeout, active)
                        .await
                {
                    tracing::error!(conn_id = conn_id, error = %e, "Connection error");
                }
            });
        }
    }

    /// The dispatcher shared by all connections
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Number of currently open WebSocket connections
    pub fn active_connections(&self) -> i64 {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Get the local address the server is listening on
    ///
    /// Useful with port 0, where the OS picks the port.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}
