//! Error taxonomy shared by the store and every adapter.

use thiserror::Error;

/// Errors returned by adapter operations.
///
/// Construction-time errors (`Config`, or an initial `UpstreamIo`) abort
/// adapter creation. Everything else fails only the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// Malformed or incomplete adapter configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A read, write or subscribe referenced a path the adapter doesn't know.
    #[error("Path {0} not found")]
    PathNotFound(String),

    /// An outbound write path lies outside the adapter's namespace.
    #[error("Path {0} is not supported")]
    UnsupportedPath(String),

    /// A value has the wrong shape for the path it was written to.
    #[error("Invalid value for path {0}")]
    InvalidValue(String),

    /// Network or file failure while talking to the backing source.
    #[error("Upstream I/O error: {0}")]
    UpstreamIo(String),

    /// The backing source refused a write.
    #[error("Upstream rejected write: {0}")]
    UpstreamRejected(String),
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::UpstreamIo(format!("JSON: {err}"))
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::UpstreamIo(err.to_string())
    }
}

/// Result alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
