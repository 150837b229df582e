//! Core JSON-RMC types and codec for jrmc
//!
//! JSON-RMC (remote method call) addresses a method by a resource path and a
//! method name instead of a flat method table:
//!
//! ```text
//! {"id": 1, "resource": "/math", "method": "triple", "params": [10]}
//! {"id": 1, "result": 30}
//! ```
//!
//! This crate holds what both ends of a connection share:
//!
//! - **Types**: `Request`, `Response` and its `Outcome`
//! - **Codec**: text <-> JSON value conversion with error mapping
//! - **Errors**: the dispatch taxonomy and transport errors
//! - **Observability**: `tracing` subscriber and OpenTelemetry setup
//!
//! The dispatch engine itself lives in `jrmc-server`; the crate is transport
//! agnostic and works on decoded `serde_json::Value`s.
//!
//! # Example
//!
//! ```rust
//! use jrmc_core::{codec, Request, Response};
//! use serde_json::json;
//!
//! let request = Request::new("/math", "triple", vec![json!(10)]).with_id(json!(1));
//! let json = codec::encode_request(&request).unwrap();
//! assert!(json.contains("\"resource\":\"/math\""));
//!
//! let response = codec::decode_response(r#"{"id":1,"result":30}"#).unwrap();
//! assert_eq!(response, Response::success(Some(json!(1)), json!(30)));
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use error::{BoxError, DispatchError, Error, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Outcome, Request, Response};
