//! Storage error model.

use thiserror::Error;

use juris_auth::DirectoryError;
use juris_core::DomainError;

/// Failure of a store operation.
///
/// `NotFound` covers both "absent" and "belongs to another firm"; callers
/// cannot tell them apart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// Uniqueness or state precondition (duplicate CNPJ, email, document;
    /// client with active cases).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced parent is missing from the caller's firm.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backend is temporarily unreachable (pool exhausted, connection
    /// refused). Safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => StoreError::NotFound,
            DomainError::Conflict(msg) => StoreError::Conflict(msg),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                StoreError::Validation(msg)
            }
        }
    }
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        DirectoryError(err.to_string())
    }
}
