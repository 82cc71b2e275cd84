//! Service-level error taxonomy.

use crate::storage::DatabaseError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a ticket or account operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or missing required input.
    #[error("{0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Missing, invalid, or expired session.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[source] DatabaseError),

    /// Token signing or password hashing failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(what) => Self::NotFound(what),
            other => Self::Store(other),
        }
    }
}
