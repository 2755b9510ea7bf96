//! Dev Tools Server Library
//!
//! This crate provides the backend of the dev tools application: it discovers
//! tool packages on disk, validates their descriptors and mounts each tool's
//! HTTP endpoints under its own `/api/<tool-id>` prefix.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling, the
//!   application host and the HTTP transport
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Tool discovery, the registry and the compiled-in tool plugins
//!
//! # Example
//!
//! ```rust,no_run
//! use devtools_server::core::{Config, DevToolsServer, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let transport = HttpTransport::new(config.http.clone());
//!     let server = DevToolsServer::new(config);
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, DevToolsServer, Error, Result};
