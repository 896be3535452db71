//! Error types for the coordination layer.
//!
//! Validation failures are rejected before any side effect. Scheduling and
//! persistence failures abort the operation that hit them and are surfaced
//! as-is. Runtime-info and address lookup failures never reach this type;
//! they are logged and the read degrades instead.

use podreg_core::{PodId, ValidationErrors};
use podreg_scheduler::SchedulerError;
use podreg_store::StoreError;
use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur in pod lifecycle operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The pod failed validation.
    #[error("invalid pod: {0}")]
    Validation(#[from] ValidationErrors),

    /// No placement could be chosen.
    #[error("scheduling failed: {0}")]
    Scheduling(#[from] SchedulerError),

    /// Registry read or write failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A fetch returned a different object than the one being waited on.
    #[error("expected pod {expected}, registry returned {found}")]
    UnexpectedObject {
        /// The pod being waited on.
        expected: PodId,
        /// The pod that came back.
        found: PodId,
    },

    /// The pod did not reach a terminal status within the poll limit.
    #[error("pod {pod_id} did not converge after {attempts} polls")]
    PollLimitExceeded {
        /// The pod being waited on.
        pod_id: PodId,
        /// Fetches made before giving up.
        attempts: u32,
    },

    /// The operation was aborted before it finished.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Scheduling(e) => e.http_status_code(),
            Self::Store(StoreError::NotFound(_)) => 404,
            Self::Store(StoreError::AlreadyExists(_)) => 409,
            Self::PollLimitExceeded { .. } => 504,
            Self::Cancelled => 499,
            Self::Store(_) | Self::UnexpectedObject { .. } | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Scheduling(e) => e.is_retriable(),
            Self::Store(e) => e.is_retriable(),
            Self::PollLimitExceeded { .. } | Self::Internal(_) => true,
            Self::Validation(_) | Self::UnexpectedObject { .. } | Self::Cancelled => false,
        }
    }
}
