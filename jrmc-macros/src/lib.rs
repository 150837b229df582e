//! Procedural macros for the jrmc remote method call toolkit
//!
//! ## `#[method]`
//!
//! Turns a plain function over typed arguments into a factory for a
//! `Box<dyn jrmc_server::Method>`, ready to be registered on a resource:
//!
//! ```ignore
//! use jrmc::server::Resource;
//!
//! #[jrmc::method]
//! fn triple(x: i64) -> Result<i64, String> {
//!     Ok(3 * x)
//! }
//!
//! let math = Resource::new().with_method("triple", triple());
//! ```
//!
//! The request's `params` array is matched against the arguments by
//! position.
//!
//! ## Crate path
//!
//! The generated code refers to the server crate as `jrmc_server`, which
//! resolves when `jrmc-server` is a direct dependency. Crates that only
//! depend on the `jrmc` facade point the macro at its re-export:
//!
//! ```ignore
//! #[jrmc::method(crate = jrmc::server)]
//! fn triple(x: i64) -> Result<i64, String> {
//!     Ok(3 * x)
//! }
//! ```

mod method;

use proc_macro::TokenStream;

/// Attribute macro for defining remotely callable methods
///
/// # Requirements
///
/// - a free, non-async, non-generic function
/// - every argument type implements `serde::Deserialize`
/// - the return type is `Result<T, E>` with `T: Serialize` and
///   `E: Into<Box<dyn Error + Send + Sync>>` (`String`, `&str` and any
///   error type qualify)
///
/// The generated function keeps the original name, visibility and
/// attributes, and takes no arguments.
///
/// # Arguments
///
/// - `crate = <path>`: where the server crate is reachable (default
///   `jrmc_server`), e.g. `jrmc::server` behind the facade
///
/// # Examples
///
/// ```ignore
/// #[method]
/// fn greet(name: String, excited: bool) -> Result<String, String> {
///     Ok(if excited { format!("Hello, {}!", name) } else { format!("Hello, {}", name) })
/// }
///
/// #[method]
/// fn version() -> Result<&'static str, String> {
///     Ok(env!("CARGO_PKG_VERSION"))
/// }
/// ```
#[proc_macro_attribute]
pub fn method(attr: TokenStream, item: TokenStream) -> TokenStream {
    method::method_impl(attr, item)
}
