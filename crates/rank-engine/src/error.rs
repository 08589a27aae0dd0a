//! Error types for the reputation engine.

use rank_core::CoreError;
use rank_store::StoreError;
use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A referenced user, item or rating does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind.
        kind: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// Caller input or configuration is outside the accepted domain.
    #[error("validation error: {0}")]
    Validation(String),

    /// Stored vote state and counters disagree, or a uniqueness rule was hit.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record store failed to serve a read or write.
    #[error("transient storage error: {0}")]
    TransientStorage(String),

    /// Unexpected fault inside a background task.
    #[error("internal fault: {0}")]
    InternalFault(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStorage(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            StoreError::Unavailable(msg) | StoreError::Snapshot(msg) => Self::TransientStorage(msg),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            err @ StoreError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::Conflict(err.to_string())
        }
    }
}
