use thiserror::Error;

use crate::repositories::RepositoryError;

/// Errors surfaced by the planning core.
///
/// Validation errors are raised before any write; a multi-step operation
/// that fails midway stops immediately and reports the failing step.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("{0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl PlanningError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<RepositoryError> for PlanningError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DatabaseError(e) => Self::Storage(e.to_string()),
            RepositoryError::NotFound(what) => Self::NotFound(what),
        }
    }
}
