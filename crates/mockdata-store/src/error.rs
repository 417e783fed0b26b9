//! Error types for the mockd data store and bootstrap loader.

use thiserror::Error;

/// Result type alias for data store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures returned by [`DataStore`](crate::DataStore) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A mutation's post-condition did not hold after it was applied.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// Structurally invalid request, raised at the decode boundary.
    #[error("malformed data: {0}")]
    MalformedData(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Errors that can occur while loading the bootstrap document.
///
/// Only [`LoadError::Parse`] escapes [`load`](crate::loader::load); open and
/// decompression failures degrade to an empty document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open bootstrap source: {0}")]
    Open(#[from] std::io::Error),

    #[error("failed to decompress bootstrap source: {0}")]
    Decompress(String),

    #[error("malformed bootstrap document: {0}")]
    Parse(#[from] serde_json::Error),
}
