//! Error types for cached query execution
//!
//! Failures are split by the collaborator that produced them. Only
//! [`ExecutorError`] can fail a query; [`CacheError`] and [`CodecError`]
//! degrade the call to "caching disabled" and are reported to the observer.

use thiserror::Error;

/// Failure reported by the query executor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// Connection error - network or connection pool issues
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The statement was rejected or failed while running
    #[error("Query error: {0}")]
    QueryError(String),

    /// Constraint violation reported by the database
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Operation timeout
    #[error("Operation timed out after {timeout_seconds}s: {context}")]
    TimeoutError {
        timeout_seconds: u64,
        context: String,
    },

    /// Generic executor failure
    #[error("Executor error: {0}")]
    Other(String),
}

/// Failure reported by the cache store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Store unreachable
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    /// Operation timeout
    #[error("Cache operation timed out after {timeout_seconds}s")]
    TimeoutError { timeout_seconds: u64 },

    /// Store rejected the value (size limit, bad arguments)
    #[error("Cache rejected value: {0}")]
    Rejected(String),

    /// Backend-specific error
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Failure to encode a result for storage or decode a stored payload
#[derive(Error, Debug)]
pub enum CodecError {
    /// Invalid JSON or a payload that does not match the envelope
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Envelope written by an incompatible version
    #[error("Unsupported payload version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Payload parsed but its shape is inconsistent
    #[error("Malformed payload: {0}")]
    Shape(String),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
