//! Callable members of resource nodes
//!
//! A `Method` receives the request's `params` as an ordered slice and returns
//! a JSON value or an error. Methods are synchronous: dispatch has no
//! suspension points, and a server that wants isolation runs the whole
//! dispatch on a blocking worker.
//!
//! # Creating Methods
//!
//! 1. **from_fn**: wrap a closure over the raw positional `&[Value]`
//! 2. **from_typed_fn**: wrap a closure over a tuple; the params array is
//!    deserialized into the tuple, so arity and type mismatches become
//!    invocation errors
//! 3. **#[method]**: attribute macro from `jrmc-macros` for plain functions
//!
//! # Examples
//!
//! ```rust
//! use jrmc_server::{from_fn, from_typed_fn, Method};
//! use serde_json::json;
//!
//! let echo = from_fn(|params| Ok(json!(params)));
//!
//! let sum = from_typed_fn(|(x, y): (i64, i64)| Ok::<_, String>(x + y));
//! assert_eq!(sum.call(&[json!(2), json!(3)]).unwrap(), json!(5));
//! ```

use jrmc_core::BoxError;
use serde_json::Value;
use std::fmt;

/// Result of calling a method body
pub type MethodResult = std::result::Result<Value, BoxError>;

/// A remotely callable member of a resource node
///
/// `Send + Sync` because the tree is shared by every connection task.
pub trait Method: Send + Sync {
    /// Call with positional parameters, in request order
    fn call(&self, params: &[Value]) -> MethodResult;
}

/// Adapts a closure over raw params into a `Method`
pub struct FnMethod<F>
where
    F: Fn(&[Value]) -> MethodResult + Send + Sync,
{
    func: F,
}

impl<F> FnMethod<F>
where
    F: Fn(&[Value]) -> MethodResult + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Method for FnMethod<F>
where
    F: Fn(&[Value]) -> MethodResult + Send + Sync,
{
    fn call(&self, params: &[Value]) -> MethodResult {
        (self.func)(params)
    }
}

impl<F> fmt::Debug for FnMethod<F>
where
    F: Fn(&[Value]) -> MethodResult + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMethod").finish_non_exhaustive()
    }
}

/// Create a method from a closure that works with raw JSON params
///
/// ```rust
/// use jrmc_server::{from_fn, Method};
/// use serde_json::json;
///
/// let count = from_fn(|params| Ok(json!(params.len())));
/// assert_eq!(count.call(&[json!(1), json!(2)]).unwrap(), json!(2));
/// ```
pub fn from_fn<F>(func: F) -> Box<dyn Method>
where
    F: Fn(&[Value]) -> MethodResult + Send + Sync + 'static,
{
    Box::new(FnMethod::new(func))
}

/// Create a method from a closure over typed positional arguments
///
/// `P` is normally a tuple, `(i64,)` for one argument, `(String, f64)` for
/// two. The params array is deserialized into it as a JSON array, so a wrong
/// argument count fails with serde's "invalid length" message. The return
/// value is serialized back to JSON.
///
/// ```rust
/// use jrmc_server::{from_typed_fn, Method};
/// use serde_json::json;
///
/// let triple = from_typed_fn(|(x,): (i64,)| Ok::<_, String>(3 * x));
/// assert_eq!(triple.call(&[json!(10)]).unwrap(), json!(30));
/// assert!(triple.call(&[]).is_err());
/// ```
pub fn from_typed_fn<P, R, E, F>(func: F) -> Box<dyn Method>
where
    P: serde::de::DeserializeOwned,
    R: serde::Serialize,
    E: Into<BoxError>,
    F: Fn(P) -> std::result::Result<R, E> + Send + Sync + 'static,
{
    from_fn(move |params: &[Value]| {
        let args: P = serde_json::from_value(Value::Array(params.to_vec()))?;
        let result = func(args).map_err(Into::<BoxError>::into)?;
        Ok(serde_json::to_value(result)?)
    })
}

/// A sub-application answering every call below its mount point
///
/// Unlike a [`Method`], an application is handed the whole call: the path
/// segments left over after its mount point, the method name and the params.
/// It decides on its own what exists and what is callable, so the exposure
/// gate does not apply to it.
pub trait Application: Send + Sync {
    /// Answer a call addressed to `path` (relative to the mount point)
    fn handle(&self, path: &[&str], method: &str, params: &[Value]) -> MethodResult;
}

/// Adapts a closure into an `Application`
pub struct FnApplication<F>
where
    F: Fn(&[&str], &str, &[Value]) -> MethodResult + Send + Sync,
{
    func: F,
}

impl<F> FnApplication<F>
where
    F: Fn(&[&str], &str, &[Value]) -> MethodResult + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Application for FnApplication<F>
where
    F: Fn(&[&str], &str, &[Value]) -> MethodResult + Send + Sync,
{
    fn handle(&self, path: &[&str], method: &str, params: &[Value]) -> MethodResult {
        (self.func)(path, method, params)
    }
}

impl<F> fmt::Debug for FnApplication<F>
where
    F: Fn(&[&str], &str, &[Value]) -> MethodResult + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnApplication").finish_non_exhaustive()
    }
}

/// Create an application from a closure over `(path, method, params)`
///
/// ```rust
/// use jrmc_server::{from_app_fn, Application};
/// use serde_json::json;
///
/// let rows = from_app_fn(|path, method, _params| match (path, method) {
///     ([id], "get") => Ok(json!({"row": id})),
///     _ => Err(format!("No such method: {}!", method).into()),
/// });
/// assert_eq!(rows.handle(&["7"], "get", &[]).unwrap(), json!({"row": "7"}));
/// ```
pub fn from_app_fn<F>(func: F) -> Box<dyn Application>
where
    F: Fn(&[&str], &str, &[Value]) -> MethodResult + Send + Sync + 'static,
{
    Box::new(FnApplication::new(func))
}
