//! Errors raised while building or checking firm records.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Input and record-level failures, free of any HTTP or storage vocabulary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Rejected input: empty required field, bad email, negative amount,
    /// a parent row the caller cannot see.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A path or body id that is not a UUID.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Absent, or owned by another firm. The two are never told apart.
    #[error("not found")]
    NotFound,

    /// Duplicate CNPJ / email / client document, or a client that still has
    /// active cases.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `"{field} {problem}"`, e.g. `name must not be empty`.
    pub fn field(field: &str, problem: &str) -> Self {
        Self::Validation(format!("{field} {problem}"))
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_name_the_field() {
        let err = DomainError::field("email", "is not a valid email address");
        assert_eq!(
            err,
            DomainError::Validation("email is not a valid email address".into())
        );
        assert_eq!(
            err.to_string(),
            "validation failed: email is not a valid email address"
        );
    }
}
