use std::time::Duration;

use thiserror::Error;

use crate::connection::{ConnectionAction, ConnectionStatus};

/// Errors from repository operations (used by trait definitions in proflink-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Convert, naming the row a write expected to find when it was missing.
    pub fn missing(self, entity: &'static str, id: impl ToString) -> IntegrityError {
        match self {
            RepositoryError::NotFound => IntegrityError::not_found(entity, id),
            other => other.into(),
        }
    }
}

/// Error taxonomy surfaced by the integrity layer to its callers.
///
/// Composite operations roll back entirely and return the originating
/// error unchanged.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("cannot {action} a connection that is {status}")]
    InvalidState {
        action: ConnectionAction,
        status: ConnectionStatus,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Coarse classification of [`IntegrityError`] for the service layer
/// (e.g. mapping to HTTP status codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidArgument,
    InvalidState,
    Forbidden,
    Timeout,
    Storage,
}

impl IntegrityError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        IntegrityError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            IntegrityError::NotFound { .. } => ErrorKind::NotFound,
            IntegrityError::Conflict(_) => ErrorKind::Conflict,
            IntegrityError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            IntegrityError::InvalidState { .. } => ErrorKind::InvalidState,
            IntegrityError::Forbidden(_) => ErrorKind::Forbidden,
            IntegrityError::Timeout(_) => ErrorKind::Timeout,
            IntegrityError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<RepositoryError> for IntegrityError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // Unique constraints in the store are the final arbiter.
            RepositoryError::Conflict(msg) => IntegrityError::Conflict(msg),
            RepositoryError::NotFound => IntegrityError::NotFound {
                entity: "row",
                id: String::new(),
            },
            other => IntegrityError::Storage(other.to_string()),
        }
    }
}
