//! Transport error types.

use std::io;

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that stop the HTTP listener.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured address could not be bound.
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The listener is bound but its local address is unavailable.
    #[error("Cannot read listener address: {0}")]
    LocalAddr(#[source] io::Error),

    /// The server loop exited with an error.
    #[error("HTTP server failed: {0}")]
    Serve(#[source] io::Error),
}

impl TransportError {
    /// Create a bind error.
    pub fn bind(address: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_names_address() {
        let err = TransportError::bind(
            "127.0.0.1:5000",
            io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to bind to 127.0.0.1:5000: address in use"
        );
    }
}
