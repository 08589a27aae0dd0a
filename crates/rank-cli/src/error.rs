//! CLI error types.

use rank_core::CoreError;
use rank_engine::EngineError;
use rank_store::StoreError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// An engine operation failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The state file could not be loaded or saved.
    #[error("state error: {0}")]
    State(#[from] StoreError),

    /// A user or item reference did not resolve.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
