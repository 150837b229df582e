//! Per-call hooks
//!
//! Optional callbacks threaded through dispatch and run synchronously around
//! the invoke stage:
//!
//! - `before(&Request)` runs right before the method is called
//! - `after(&Request, &Result)` runs right after, on success and on failure
//!
//! Neither runs for requests that fail validation, resolution or the gate;
//! the hooks only ever see calls that reached an exposed method or a mounted
//! application.
//!
//! Hooks run inside the same panic capture as the call. A panicking `before`
//! hook cancels the call and a panicking `after` hook replaces its outcome;
//! either way the caller gets an error envelope carrying the panic message.
//!
//! # Examples
//!
//! ```rust
//! use jrmc_server::{dispatch_with, from_fn, CallHooks, Resource};
//! use serde_json::json;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = calls.clone();
//! let hooks = CallHooks::new().before(move |_request| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! let root = Resource::new().with_method("ping", from_fn(|_| Ok(json!("pong"))));
//! dispatch_with(&root, json!({"resource": "/", "method": "ping"}), &hooks);
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

use jrmc_core::{DispatchError, Request};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type BeforeHook = Arc<dyn Fn(&Request) + Send + Sync>;
type AfterHook = Arc<dyn Fn(&Request, &Result<Value, DispatchError>) + Send + Sync>;

/// Before/after callbacks for the invoke stage
#[derive(Clone, Default)]
pub struct CallHooks {
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
}

impl CallHooks {
    /// No hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hook run before each invocation
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Set the hook run after each invocation
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &Result<Value, DispatchError>) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }

    /// Hooks that log every invocation and its outcome at debug level
    pub fn tracing() -> Self {
        Self::new()
            .before(|request| {
                tracing::debug!(
                    resource = %request.resource,
                    method = %request.method,
                    params = request.params.len(),
                    "Invoking method"
                );
            })
            .after(|request, outcome| match outcome {
                Ok(_) => tracing::debug!(
                    resource = %request.resource,
                    method = %request.method,
                    "Method completed"
                ),
                Err(e) => tracing::debug!(
                    resource = %request.resource,
                    method = %request.method,
                    error = %e,
                    "Method failed"
                ),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_none() && self.after.is_none()
    }

    pub(crate) fn run_before(&self, request: &Request) {
        if let Some(hook) = &self.before {
            hook(request);
        }
    }

    pub(crate) fn run_after(&self, request: &Request, outcome: &Result<Value, DispatchError>) {
        if let Some(hook) = &self.after {
            hook(request, outcome);
        }
    }
}

impl fmt::Debug for CallHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallHooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_empty_hooks() {
        let hooks = CallHooks::new();
        assert!(hooks.is_empty());
        hooks.run_before(&Request::new("/", "m", vec![]));
        hooks.run_after(&Request::new("/", "m", vec![]), &Ok(json!(1)));
    }

    #[test]
    fn test_hooks_receive_request_and_outcome() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let before_log = seen.clone();
        let after_log = seen.clone();

        let hooks = CallHooks::new()
            .before(move |request| {
                before_log.lock().unwrap().push(format!("before {}", request.method));
            })
            .after(move |request, outcome| {
                let status = if outcome.is_ok() { "ok" } else { "err" };
                after_log.lock().unwrap().push(format!("after {} {}", request.method, status));
            });
        assert!(!hooks.is_empty());

        let request = Request::new("/math", "triple", vec![json!(1)]);
        hooks.run_before(&request);
        hooks.run_after(&request, &Err(DispatchError::invocation("boom")));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["before triple".to_string(), "after triple err".to_string()]
        );
    }

    #[test]
    fn test_debug_output() {
        let hooks = CallHooks::new().after(|_, _| {});
        assert_eq!(format!("{:?}", hooks), "CallHooks { before: false, after: true }");
    }
}
