//! Error types for the Quarry engine.

use thiserror::Error;

/// Result type alias for Quarry operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types raised while building or pulling index streams.
///
/// Threshold overflows are never reported here; they travel as data
/// (`ShardMatchSet::is_infinite` or a deferred `EvaluationContext`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A stream or tree was constructed with invalid inputs.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    /// `peek`/`next` on an exhausted stream, or a stream broke its ordering contract.
    #[error("illegal state: {message}")]
    IllegalState { message: String },
    /// The operation is permanently unsupported by the stream contract.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation { operation: &'static str },
    /// A leaf scanner failed while reading the index.
    #[error("scan failed on {source_name}: {message}")]
    Scan {
        source_name: String,
        message: String,
    },
    /// Engine configuration could not be parsed or is out of range.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an illegal state error.
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Error::IllegalState {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Error::UnsupportedOperation { operation }
    }

    /// Creates a scan error for the named source.
    pub fn scan(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Scan {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Returns true if this error came from the storage side of a leaf scan.
    pub fn is_scan_failure(&self) -> bool {
        matches!(self, Error::Scan { .. })
    }
}
