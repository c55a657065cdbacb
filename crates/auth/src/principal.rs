use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use juris_core::{FirmId, FirmOwned, UserId};

use crate::Role;

/// The acting user of a request, as currently stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub firm_id: FirmId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

impl FirmOwned for Principal {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

/// A principal together with its stored password hash (login only).
#[derive(Clone)]
pub struct PrincipalRecord {
    pub principal: Principal,
    pub password_hash: String,
}

impl core::fmt::Debug for PrincipalRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrincipalRecord")
            .field("principal", &self.principal)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DirectoryError(pub String);

/// Read access to stored principals.
///
/// Lookups are global (not firm-scoped): they happen before any scope exists.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    async fn find_principal_by_id(&self, id: UserId) -> Result<Option<Principal>, DirectoryError>;

    /// `email` is expected to be normalized with [`normalize_email`].
    async fn find_principal_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PrincipalRecord>, DirectoryError>;
}

#[async_trait]
impl<T> PrincipalDirectory for Arc<T>
where
    T: PrincipalDirectory + ?Sized,
{
    async fn find_principal_by_id(&self, id: UserId) -> Result<Option<Principal>, DirectoryError> {
        (**self).find_principal_by_id(id).await
    }

    async fn find_principal_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PrincipalRecord>, DirectoryError> {
        (**self).find_principal_by_email(email).await
    }
}

/// Canonical form of an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
