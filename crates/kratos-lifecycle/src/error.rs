use thiserror::Error as ThisError;

use kratos_data::{MembershipStatus, QueryError};

/// Failures of a lifecycle operation. Validation and transition
/// errors are caller mistakes; Store wraps anything the persistence
/// layer reports.
#[derive(Debug, ThisError)]
pub enum LifecycleError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("cannot {action} membership in status {status}")]
    InvalidTransition {
        action: &'static str,
        status: MembershipStatus,
    },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl LifecycleError {
    /// Wrap a store error, turning a missing row into NotFound.
    pub fn from_store(what: &'static str, err: anyhow::Error) -> Self {
        match err.downcast_ref::<QueryError>() {
            Some(QueryError::NotFound) => LifecycleError::NotFound(what),
            _ => LifecycleError::Store(err),
        }
    }
}
