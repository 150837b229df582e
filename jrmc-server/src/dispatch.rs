//! Dispatch pipeline
//!
//! One call runs five stages, each returning `Result<_, DispatchError>`:
//!
//! ```text
//! validate -> resolve -> gate -> [before hook] invoke [after hook] -> build
//! ```
//!
//! The first failing stage short-circuits to `build`, which is the only
//! place the error turns into the response's `error` string. Dispatch never
//! panics outward and always yields exactly one [`Response`]: the hooks run
//! inside the same capture boundary as the method, so a panicking hook
//! becomes an invocation error too. A `before` hook that panics stops the
//! call before the method runs.
//!
//! A path ending in a mounted application skips the gate: the application
//! receives the remaining segments and answers the call itself, still
//! between the two hooks.
//!
//! Dispatch is synchronous and keeps no state between calls. The resource
//! tree is only read, so any number of dispatches can share it. A method
//! that blocks blocks its caller: timeouts belong to the embedding server
//! (see `ServerBuilder::call_timeout`).

use crate::gate::gate;
use crate::hooks::CallHooks;
use crate::invoker::{capture, invoke, invoke_app};
use crate::metrics::DispatchMetrics;
use crate::resolver::{self, resolve, ResolvePolicy, Target};
use crate::response::build;
use crate::tree::ResourceNode;
use crate::validator::{request_id, validate};
use jrmc_core::{codec, DispatchError, Request, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Dispatch a decoded request against `root`
///
/// # Examples
///
/// ```rust
/// use jrmc_server::{dispatch, from_typed_fn, Resource};
/// use serde_json::json;
///
/// let root = Resource::new().with_child(
///     "math",
///     Resource::new().with_method("triple", from_typed_fn(|(x,): (i64,)| Ok::<_, String>(3 * x))),
/// );
///
/// let response = dispatch(&root, json!({"id": 1, "resource": "/math", "method": "triple", "params": [10]}));
/// assert_eq!(response.into_value(), json!({"id": 1, "result": 30}));
/// ```
pub fn dispatch(root: &dyn ResourceNode, request: Value) -> Response {
    dispatch_with(root, request, &CallHooks::default())
}

/// [`dispatch`] with before/after hooks around the invoke stage
pub fn dispatch_with(root: &dyn ResourceNode, request: Value, hooks: &CallHooks) -> Response {
    let (id, outcome) = execute(root, request, hooks, ResolvePolicy::default()).into_parts();
    build(id, outcome)
}

/// Decode `text`, dispatch it, and encode the response
///
/// Fails only when `text` is not JSON; every other problem is reported
/// inside the returned envelope.
pub fn handle_str(root: &dyn ResourceNode, text: &str) -> jrmc_core::Result<String> {
    let request = codec::decode(text)?;
    codec::encode_response(&dispatch(root, request))
}

/// Metric label for requests that never reached a callable target
const UNRESOLVED: &str = "unresolved";

/// Metric label standing in for the method name of application calls
const APPLICATION: &str = "*";

/// Finished dispatch before the response is built
struct Execution {
    id: Option<Value>,
    labels: Option<Labels>,
    outcome: Result<Value, DispatchError>,
}

impl Execution {
    fn into_parts(self) -> (Option<Value>, Result<Value, DispatchError>) {
        (self.id, self.outcome)
    }
}

/// Metric attributes, only known once a call passed resolution and the gate
///
/// Built from registered names only (normalized path, mount point), never
/// from arbitrary caller input.
struct Labels {
    resource: String,
    method: String,
}

impl Labels {
    fn new<'s>(segments: impl IntoIterator<Item = &'s str>, method: &str) -> Self {
        let path: Vec<&str> = segments.into_iter().collect();
        Self {
            resource: format!("/{}", path.join("/")),
            method: method.to_string(),
        }
    }
}

fn execute(root: &dyn ResourceNode, value: Value, hooks: &CallHooks, policy: ResolvePolicy) -> Execution {
    let id = request_id(&value);

    let request = match validate(value) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Request rejected");
            return Execution {
                id,
                labels: None,
                outcome: Err(e),
            };
        }
    };

    let (labels, outcome) = match call(root, &request, hooks, policy) {
        Ok((labels, outcome)) => (Some(labels), outcome),
        Err(e) => (None, Err(e)),
    };
    Execution { id, labels, outcome }
}

/// Resolve and gate, then run the call between the hooks
///
/// The outer `Err` is a resolution or gate failure; the inner outcome is
/// what the call itself produced.
fn call(
    root: &dyn ResourceNode,
    request: &Request,
    hooks: &CallHooks,
    policy: ResolvePolicy,
) -> Result<(Labels, Result<Value, DispatchError>), DispatchError> {
    match resolve(root, &request.resource, policy)? {
        Target::Node(node) => {
            let method = gate(node, &request.method)?;
            let labels = Labels::new(resolver::segments(&request.resource), &request.method);
            Ok((labels, around(request, hooks, || invoke(method, &request.params))))
        }
        Target::Application { app, mount, rest } => {
            let labels = Labels::new(mount, APPLICATION);
            let outcome = around(request, hooks, || {
                invoke_app(app, &rest, &request.method, &request.params)
            });
            Ok((labels, outcome))
        }
    }
}

/// Run `target` between the before and after hooks
///
/// A hook panic is reported like a method panic. When `before` panics the
/// call is skipped; when `after` panics its message replaces the outcome.
fn around(
    request: &Request,
    hooks: &CallHooks,
    target: impl FnOnce() -> Result<Value, DispatchError>,
) -> Result<Value, DispatchError> {
    if let Err(message) = capture(|| hooks.run_before(request)) {
        tracing::warn!(error = %message, "Before hook panicked");
        return Err(DispatchError::invocation(message));
    }

    let outcome = target();

    match capture(|| hooks.run_after(request, &outcome)) {
        Ok(()) => outcome,
        Err(message) => {
            tracing::warn!(error = %message, "After hook panicked");
            Err(DispatchError::invocation(message))
        }
    }
}

/// Shareable dispatch configuration: a tree plus hooks, policy and metrics
///
/// Cloning is cheap; the server hands one clone to every connection.
///
/// ```rust
/// use jrmc_server::{from_fn, Dispatcher, Resource, ResolvePolicy};
/// use serde_json::json;
///
/// let dispatcher = Dispatcher::new(Resource::new().with_method("ping", from_fn(|_| Ok(json!("pong")))))
///     .with_policy(ResolvePolicy::ExposedSegments);
///
/// let reply = dispatcher.handle_str(r#"{"id":"p","resource":"/","method":"ping"}"#).unwrap();
/// assert_eq!(reply, r#"{"id":"p","result":"pong"}"#);
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    root: Arc<dyn ResourceNode>,
    hooks: CallHooks,
    policy: ResolvePolicy,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl Dispatcher {
    pub fn new(root: impl ResourceNode + 'static) -> Self {
        Self::from_arc(Arc::new(root))
    }

    /// Share an already reference-counted tree
    pub fn from_arc(root: Arc<dyn ResourceNode>) -> Self {
        Self {
            root,
            hooks: CallHooks::default(),
            policy: ResolvePolicy::default(),
            metrics: None,
        }
    }

    pub fn with_hooks(mut self, hooks: CallHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn root(&self) -> &dyn ResourceNode {
        self.root.as_ref()
    }

    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    pub fn metrics(&self) -> Option<&Arc<DispatchMetrics>> {
        self.metrics.as_ref()
    }

    /// Dispatch a decoded request
    pub fn dispatch(&self, request: Value) -> Response {
        let start = Instant::now();
        let execution = execute(self.root.as_ref(), request, &self.hooks, self.policy);

        if let Some(metrics) = &self.metrics {
            let (resource, method) = match &execution.labels {
                Some(labels) => (labels.resource.as_str(), labels.method.as_str()),
                None => (UNRESOLVED, UNRESOLVED),
            };
            metrics.record_dispatch(resource, method, &execution.outcome, start.elapsed());
        }

        let (id, outcome) = execution.into_parts();
        build(id, outcome)
    }

    /// Decode, dispatch and encode one text message
    pub fn handle_str(&self, text: &str) -> jrmc_core::Result<String> {
        let request = codec::decode(text)?;
        codec::encode_response(&self.dispatch(request))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("hooks", &self.hooks)
            .field("policy", &self.policy)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
