//! JRMC - JSON Remote Method Calls
//!
//! Convenience crate re-exporting every jrmc sub-crate, for applications that
//! want the server, the client and the macros behind one dependency.
//!
//! # Architecture
//!
//! - **jrmc-core**: envelope types, codec, error taxonomy, observability
//! - **jrmc-server**: resource tree, dispatch engine, WebSocket server
//! - **jrmc-client**: WebSocket client
//! - **jrmc-macros**: `#[method]` for typed method registration
//!
//! # Quick Start - Server
//!
//! ```rust,no_run
//! use jrmc::server::Resource;
//! use jrmc::JrmcServer;
//!
//! // Crates depending only on `jrmc` point the macro at the re-export
//! #[jrmc::method(crate = jrmc::server)]
//! fn triple(x: i64) -> Result<i64, String> {
//!     Ok(3 * x)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = Resource::new().with_child("math", Resource::new().with_method("triple", triple()));
//!
//!     let addr: std::net::SocketAddr = "127.0.0.1:8080".parse()?;
//!     let server = JrmcServer::builder().bind(addr).root(root).build().await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Client
//!
//! ```rust,no_run
//! use jrmc::JrmcClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = JrmcClient::connect("ws://localhost:8080").await?;
//!
//!     let result = client.call("/math", "triple", vec![json!(10)]).await?;
//!     println!("Result: {}", result);
//!
//!     Ok(())
//! }
//! ```

pub use jrmc_client as client;
pub use jrmc_core as core;
pub use jrmc_macros as macros;
pub use jrmc_server as server;

pub use jrmc_client::JrmcClient;
pub use jrmc_macros::method;
pub use jrmc_server::JrmcServer;
