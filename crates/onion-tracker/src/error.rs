//! Error types for the tracking service

use std::net::SocketAddr;
use thiserror::Error;

/// Errors that stop the tracking service
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] onion_utils::ConfigError),

    /// The listener could not be bound
    #[error("failed binding listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The server loop failed
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Result type alias for the tracking service
pub type Result<T> = std::result::Result<T, TrackerError>;
