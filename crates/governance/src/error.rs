//! Governance errors
//!
//! Every failure a caller can see maps to one [`ErrorKind`]. Side-effect
//! failures never show up here; the dispatcher logs them.

use fidei_core::CoreError;
use fidei_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Authorization,
    Precondition,
    Validation,
    InvalidState,
    Internal,
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Actor {voter_id} already voted on asset {asset_id}")]
    DuplicateVote { asset_id: String, voter_id: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(StoreError),
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;

impl GovernanceError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        GovernanceError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::NotFound { .. } => ErrorKind::NotFound,
            GovernanceError::Authorization(_) => ErrorKind::Authorization,
            GovernanceError::Precondition(_) => ErrorKind::Precondition,
            GovernanceError::Validation(_) => ErrorKind::Validation,
            GovernanceError::InvalidState(_) | GovernanceError::DuplicateVote { .. } => {
                ErrorKind::InvalidState
            }
            GovernanceError::Core(CoreError::InvalidTransition { .. }) => ErrorKind::InvalidState,
            GovernanceError::Core(_) => ErrorKind::Validation,
            GovernanceError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for GovernanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => GovernanceError::NotFound { entity, id },
            other => GovernanceError::Store(other),
        }
    }
}

impl From<sqlx::Error> for GovernanceError {
    fn from(err: sqlx::Error) -> Self {
        GovernanceError::Store(StoreError::Database(err))
    }
}
