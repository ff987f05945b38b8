//! Dispatch errors

use thiserror::Error;

/// Errors raised by side-effect collaborators
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Sink '{name}' failed: {reason}")]
    SinkFailed { name: String, reason: String },

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Credential verification failed: {0}")]
    VerificationFailed(String),

    #[error("Anchoring failed: {0}")]
    AnchorFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn sink(name: impl Into<String>, reason: impl ToString) -> Self {
        DispatchError::SinkFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
