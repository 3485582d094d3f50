//! Error types for coordinator operations.
//!
//! Probe and processing failures never surface here; they are recorded on
//! the affected item. What remains is a missing id, a malformed request, or
//! a commit that could not be completed.

use thiserror::Error;

use crate::store::StoreError;

/// Error returned by a coordinator operation.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// A referenced item or pair does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The request cannot be satisfied as stated.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Committing the new state failed. Held state is unchanged.
    #[error("Failed to commit collections: {0}")]
    Orchestration(#[from] StoreError),

    /// The computed state violates an invariant. Held state is unchanged.
    #[error("Refusing to commit inconsistent collections: {0}")]
    Inconsistent(String),
}

impl CoordinatorError {
    /// Create an error for an unknown item id.
    pub fn item_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Item",
            id: id.into(),
        }
    }

    /// Create an error for an unknown pair id.
    pub fn pair_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Pair",
            id: id.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether held state could not be committed.
    pub fn is_orchestration_failure(&self) -> bool {
        matches!(self, Self::Orchestration(_) | Self::Inconsistent(_))
    }
}

/// Result type for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
