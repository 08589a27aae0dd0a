//! Error types for the record store.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind (`"user"`, `"item"`, `"rating"`).
        kind: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// A record with the same identity already exists.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Record kind.
        kind: &'static str,
        /// The duplicate identifier.
        id: String,
    },

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored records disagree with each other.
    #[error("store conflict: {0}")]
    Conflict(String),

    /// Snapshot could not be read or written.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`StoreError::AlreadyExists`].
    pub fn already_exists(kind: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}
