//! Method invocation
//!
//! Calls a gated method (or a mounted application) with its positional
//! params. Both ways a call can fail end up as `DispatchError::Invocation`
//! holding the failure's text:
//!
//! - it returns `Err(e)`: the message is `e.to_string()`
//! - it panics: the message is the panic payload (e.g. `attempt to divide by
//!   zero`), or `method panicked` when the payload is not a string
//!
//! A panic never unwinds past [`invoke`].
//!
//! # Panic output
//!
//! The standard panic hook prints every panic to stderr, including the ones
//! caught here. The first invocation installs a process-wide hook
//! ([`install_panic_hook`]) that reports panics raised inside the capture
//! boundary through `tracing::error!` instead, and hands every other panic
//! to the hook that was installed before it. An embedder that sets its own
//! hook afterwards replaces this behavior.

use crate::method::{Application, Method, MethodResult};
use jrmc_core::DispatchError;
use serde_json::Value;
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, catch_unwind, AssertUnwindSafe};
use std::sync::Once;

const OPAQUE_PANIC: &str = "method panicked";

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// Call `method` with `params`, capturing any failure
pub fn invoke(method: &dyn Method, params: &[Value]) -> Result<Value, DispatchError> {
    finish(capture(|| method.call(params)))
}

/// Hand a whole call to a mounted application, capturing any failure
pub fn invoke_app(
    app: &dyn Application,
    path: &[&str],
    method: &str,
    params: &[Value],
) -> Result<Value, DispatchError> {
    finish(capture(|| app.handle(path, method, params)))
}

/// Run `f`, turning a panic into its message
pub(crate) fn capture<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    install_panic_hook();

    let outer = CAPTURING.with(|flag| flag.replace(true));
    let result = catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|flag| flag.set(outer));

    result.map_err(|payload| panic_message(payload.as_ref()))
}

fn finish(result: Result<MethodResult, String>) -> Result<Value, DispatchError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Method returned an error");
            Err(DispatchError::invocation(e.to_string()))
        }
        Err(message) => {
            tracing::warn!(error = %message, "Method panicked");
            Err(DispatchError::invocation(message))
        }
    }
}

/// Report panics caught during dispatch through `tracing` instead of stderr
///
/// Idempotent. Panics outside the capture boundary still reach the hook
/// that was installed before this one.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let location = info.location().map(ToString::to_string).unwrap_or_default();
                tracing::error!(
                    panic = %panic_message(info.payload()),
                    location = %location,
                    "Panic captured during dispatch"
                );
            } else {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        OPAQUE_PANIC.to_string()
    }
}
