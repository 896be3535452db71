//! Error types for the storage layer.

use podreg_core::PodId;
use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The requested pod was not found.
    #[error("pod not found: {0}")]
    NotFound(PodId),

    /// A pod with this ID already exists.
    #[error("pod already exists: {0}")]
    AlreadyExists(PodId),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A watcher fell too far behind the live event stream.
    #[error("watch fell behind by {0} events")]
    WatchLagged(u64),
}

impl StoreError {
    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::WatchLagged(_))
    }
}
