//! Common error types for podreg.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the podreg system.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// A label or field selector could not be parsed.
    #[error("invalid selector: {0}")]
    InvalidSelector(#[from] crate::labels::SelectorError),

    /// The object failed validation.
    #[error(transparent)]
    Validation(#[from] crate::validation::ValidationErrors),
}
