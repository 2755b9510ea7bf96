//! Transport layer for the dev tools server.
//!
//! A single HTTP transport: the axum router with the host endpoints, the
//! per-tool dispatch under `/api/<tool-id>`, static assets, CORS and
//! request tracing.

mod config;
mod error;
pub mod http;

pub use config::HttpConfig;
pub use error::{TransportError, TransportResult};
pub use http::{HttpTransport, build_router};
