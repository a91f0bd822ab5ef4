//! Error types for the visualization server.

use thiserror::Error;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving the visualization.
///
/// Engine-level anomalies never surface here: the fold records them as
/// diagnostics and keeps going. These are the genuine failures: sockets,
/// files, serialization.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
