//! Error types and handling for the dev tools server.
//!
//! Request-level failures never get here: handlers answer with `ApiError`.
//! This type covers what can stop discovery or the listener.

use thiserror::Error;

use super::transport::TransportError;
use crate::domains::tools::ToolError;

/// A specialized Result type for server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the dev tools server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Error originating from the HTTP transport.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The blocking discovery pass panicked or was cancelled.
    #[error("Discovery task failed: {0}")]
    Discovery(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_domain_errors_convert() {
        let err: Error = ToolError::RootMissing(PathBuf::from("/nowhere")).into();
        assert!(matches!(err, Error::Tool(_)));
        assert!(err.to_string().starts_with("Tool error: "));
    }

    #[tokio::test]
    async fn test_panicked_discovery_task() {
        let join = tokio::task::spawn_blocking(|| -> usize { panic!("scan failed") }).await;
        let err: Error = join.unwrap_err().into();
        assert!(matches!(err, Error::Discovery(_)));
    }
}
