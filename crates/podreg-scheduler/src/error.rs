//! Error types for the scheduler crate.

use podreg_core::PodId;
use thiserror::Error;

/// Errors that can occur while placing a pod.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// There are no minions to place pods on.
    #[error("No minions available")]
    NoMinions,

    /// No minion can take the pod.
    #[error("No minion fits pod {0}")]
    NoFit(PodId),

    /// Listing minions failed.
    #[error("Minion listing failed: {0}")]
    MinionList(String),

    /// Kubernetes API error.
    #[error("Kubernetes API error: {0}")]
    KubeApi(#[from] kube::Error),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] podreg_store::StoreError),
}

impl SchedulerError {
    /// Check if this error is retriable.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::NoMinions | Self::NoFit(_) => false,
            Self::MinionList(_) | Self::KubeApi(_) => true,
            Self::Store(e) => e.is_retriable(),
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NoFit(_) => 409,
            Self::NoMinions | Self::MinionList(_) | Self::KubeApi(_) | Self::Store(_) => 503,
        }
    }
}

/// A specialized Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
