//! JSON-RMC client over WebSocket
//!
//! Connects to a `jrmc-server` (or anything speaking the same envelopes),
//! sends one request per text frame and matches responses back to callers
//! by id.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jrmc_client::JrmcClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = JrmcClient::connect("ws://localhost:8080").await?;
//!
//!     let result = client.call("/math", "triple", vec![json!(10)]).await?;
//!     assert_eq!(result, json!(30));
//!
//!     let tripled: i64 = client.call_typed("/math", "triple", (7,)).await?;
//!     assert_eq!(tripled, 21);
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! An `error` envelope is returned as `Error::Remote` with the server's text,
//! e.g. `No such method: secret!`. Transport failures use the other
//! `jrmc_core::Error` variants.

mod client;
mod request;

pub use client::JrmcClient;
pub use jrmc_core::{Error, Result};
