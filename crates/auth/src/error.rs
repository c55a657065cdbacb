//! Authentication and authorization error types.

use thiserror::Error;

use crate::{Role, TokenError};

/// Why a request could not be tied to a live principal.
///
/// All variants surface externally as the same 401; the distinction exists
/// for logs and tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    #[error("missing bearer token")]
    MissingToken,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("token subject does not exist")]
    UnknownPrincipal,

    #[error("token subject is inactive")]
    InactivePrincipal,

    #[error("token firm does not match the principal's firm")]
    FirmMismatch,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password (deliberately indistinguishable).
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    InactiveAccount,

    #[error("unauthenticated: {0}")]
    Unauthenticated(UnauthenticatedReason),

    #[error("insufficient permissions: role '{role}' is not one of {allowed:?}")]
    InsufficientPermissions { role: Role, allowed: Vec<Role> },

    #[error("cryptography error: {0}")]
    Crypto(String),

    /// The principal directory could not be reached (retryable).
    #[error("principal directory unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    pub fn unauthenticated(reason: impl Into<UnauthenticatedReason>) -> Self {
        Self::Unauthenticated(reason.into())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Unauthenticated(UnauthenticatedReason::Token(err))
    }
}
