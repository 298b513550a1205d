//! Error type shared by the library modules

use thiserror::Error;

/// Errors surfaced by value tables, buffers, policies, learners and environments
#[derive(Error, Debug)]
pub enum RlError {
    /// A caller-supplied argument is out of range or inconsistent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl RlError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RlError::InvalidArgument(msg.into())
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, RlError>;
