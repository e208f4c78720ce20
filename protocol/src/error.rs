use std::time::Duration;

use saltpow_types::TypesError;
use saltpow_work::WorkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("malformed command: {0}")]
    MalformedCommand(String),

    #[error("invalid difficulty: {0}")]
    InvalidDifficulty(#[from] TypesError),

    #[error("server reported error: {0}")]
    ServerError(String),

    #[error("profile has no value for {field}")]
    MissingProfileField { field: String },

    #[error("failed to load profile {path}: {reason}")]
    ProfileLoad { path: String, reason: String },

    #[error("solver returned a suffix that does not meet the difficulty: {0:?}")]
    UnverifiedSuffix(String),

    #[error("line exceeds {max} bytes")]
    LineTooLong { max: usize },

    #[error("no command received within {0:?}")]
    Timeout(Duration),

    #[error("server closed the connection")]
    Disconnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("search failed: {0}")]
    Work(#[from] WorkError),
}

impl ProtocolError {
    /// Errors worth retrying on a fresh connection.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Disconnected)
    }

    /// Session ended because the process is shutting down.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Work(WorkError::Cancelled))
    }
}
