//! Server builder for constructing JSON-RMC servers
//!
//! The builder gathers everything a `JrmcServer` needs:
//! - the bind address
//! - the resource tree to serve
//! - call hooks and the resolution policy
//! - an optional per-call timeout
//! - observability (logging, traces, metrics)
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrmc_server::{from_typed_fn, CallHooks, JrmcServer, Resource, ResolvePolicy};
//! use std::time::Duration;
//!
//! # async fn example() -> jrmc_core::Result<()> {
//! let math = Resource::new()
//!     .with_method("triple", from_typed_fn(|(x,): (i64,)| Ok::<_, String>(3 * x)));
//!
//! let server = JrmcServer::builder()
//!     .bind_str("127.0.0.1:8080")?
//!     .root(Resource::new().with_child("math", math))
//!     .hooks(CallHooks::tracing())
//!     .resolve_policy(ResolvePolicy::ExposedSegments)
//!     .call_timeout(Duration::from_secs(30))
//!     .with_default_observability()
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::{CallHooks, DispatchMetrics, Dispatcher, JrmcServer, ResolvePolicy, Resource, ResourceNode};
use jrmc_core::{Error, Result};
use std::net::SocketAddr;
use std::sync::atomic::AtomicI64;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Builder for constructing a JSON-RMC server
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    root: Option<Arc<dyn ResourceNode>>,
    hooks: CallHooks,
    resolve_policy: ResolvePolicy,
    call_timeout: Option<Duration>,
    observability_config: Option<jrmc_core::ObservabilityConfig>,
    service_name: Option<String>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            addr: None,
            root: None,
            hooks: CallHooks::default(),
            resolve_policy: ResolvePolicy::default(),
            call_timeout: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Set the bind address for the server
    pub fn bind(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Set the bind address from a string (e.g., "127.0.0.1:8080")
    pub fn bind_str(mut self, addr: &str) -> Result<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::Internal(format!("Invalid address: {}", e)))?;
        self.addr = Some(addr);
        Ok(self)
    }

    /// Set the resource tree (an empty root is served otherwise)
    pub fn root(mut self, root: impl ResourceNode + 'static) -> Self {
        self.root = Some(Arc::new(root));
        self
    }

    /// Set the resource tree from a shared handle
    pub fn shared_root(mut self, root: Arc<dyn ResourceNode>) -> Self {
        self.root = Some(root);
        self
    }

    /// Hooks run around every invocation
    pub fn hooks(mut self, hooks: CallHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// How intermediate path segments are checked (default: `LeafOnly`)
    pub fn resolve_policy(mut self, policy: ResolvePolicy) -> Self {
        self.resolve_policy = policy;
        self
    }

    /// Answer calls that take longer than `timeout` with `Request timeout`
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: jrmc_core::ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(jrmc_core::ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Bind the listener and assemble the server
    ///
    /// Also installs the dispatch panic hook up front, so a method panic on
    /// the first request is already reported through `tracing`.
    pub async fn build(self) -> Result<JrmcServer> {
        let addr = self
            .addr
            .ok_or_else(|| Error::Internal("No bind address specified".to_string()))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Io(e.to_string()))?;

        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            jrmc_core::init_observability(config.clone())
                .map_err(|e| Error::Internal(format!("Failed to initialize observability: {}", e)))?;

            Some(Arc::new(DispatchMetrics::new(config.service_name)))
        } else {
            None
        };

        crate::install_panic_hook();

        let root: Arc<dyn ResourceNode> = match self.root {
            Some(root) => root,
            None => Arc::new(Resource::new()),
        };
        let mut dispatcher = Dispatcher::from_arc(root)
            .with_hooks(self.hooks)
            .with_policy(self.resolve_policy);
        if let Some(metrics) = metrics {
            dispatcher = dispatcher.with_metrics(metrics);
        }

        tracing::info!(
            addr = %addr,
            policy = ?self.resolve_policy,
            call_timeout = ?self.call_timeout,
            "Server listening"
        );

        Ok(JrmcServer {
            listener,
            dispatcher,
            call_timeout: self.call_timeout,
            active_connections: Arc::new(AtomicI64::new(0)),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
