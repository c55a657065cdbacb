//! Session resolution: bearer token → live principal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{AuthError, Principal, PrincipalDirectory, TokenCodec, UnauthenticatedReason};

/// Resolves bearer tokens into the principal as it is stored *now*.
///
/// The token only proves identity; role and active flag always come from the
/// directory, so deactivation and role changes apply to tokens already issued.
pub struct SessionResolver<D> {
    directory: D,
    codec: Arc<TokenCodec>,
}

impl<D: PrincipalDirectory> SessionResolver<D> {
    pub fn new(directory: D, codec: Arc<TokenCodec>) -> Self {
        Self { directory, codec }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Read-only: never touches timestamps and never extends the token.
    pub async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let claims = self.codec.decode(token, now).inspect_err(|e| {
            debug!(error = %e, "bearer token rejected");
        })?;

        let principal = self
            .directory
            .find_principal_by_id(claims.sub)
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?
            .ok_or(AuthError::Unauthenticated(UnauthenticatedReason::UnknownPrincipal))?;

        if principal.firm_id != claims.firm_id {
            debug!(user_id = %principal.id, "token firm differs from stored firm");
            return Err(AuthError::unauthenticated(UnauthenticatedReason::FirmMismatch));
        }

        if !principal.is_active {
            debug!(user_id = %principal.id, "token subject is inactive");
            return Err(AuthError::unauthenticated(
                UnauthenticatedReason::InactivePrincipal,
            ));
        }

        Ok(principal)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;
    use chrono::Duration;
    use juris_core::{FirmId, UserId};

    use super::*;
    use crate::{DirectoryError, PrincipalRecord, Role, TokenError, hash_password};

    /// Directory backed by a map, for resolver and service tests.
    #[derive(Default)]
    pub(crate) struct MapDirectory {
        pub(crate) records: RwLock<HashMap<UserId, PrincipalRecord>>,
        pub(crate) offline: RwLock<bool>,
    }

    impl MapDirectory {
        pub(crate) fn insert(&self, principal: Principal, password: &str) {
            let record = PrincipalRecord {
                principal: principal.clone(),
                password_hash: hash_password(password).unwrap(),
            };
            self.records.write().unwrap().insert(principal.id, record);
        }

        pub(crate) fn set_active(&self, id: UserId, active: bool) {
            if let Some(r) = self.records.write().unwrap().get_mut(&id) {
                r.principal.is_active = active;
            }
        }

        fn check_online(&self) -> Result<(), DirectoryError> {
            if *self.offline.read().unwrap() {
                return Err(DirectoryError("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PrincipalDirectory for MapDirectory {
        async fn find_principal_by_id(
            &self,
            id: UserId,
        ) -> Result<Option<Principal>, DirectoryError> {
            self.check_online()?;
            Ok(self
                .records
                .read()
                .unwrap()
                .get(&id)
                .map(|r| r.principal.clone()))
        }

        async fn find_principal_by_email(
            &self,
            email: &str,
        ) -> Result<Option<PrincipalRecord>, DirectoryError> {
            self.check_online()?;
            Ok(self
                .records
                .read()
                .unwrap()
                .values()
                .find(|r| r.principal.email == email)
                .cloned())
        }
    }

    pub(crate) fn principal(role: Role) -> Principal {
        Principal {
            id: UserId::new(),
            firm_id: FirmId::new(),
            name: "Dr. João Advogado".into(),
            email: "joao@escritorio.com".into(),
            role,
            is_active: true,
        }
    }

    fn resolver() -> (SessionResolver<Arc<MapDirectory>>, Arc<MapDirectory>) {
        let directory = Arc::new(MapDirectory::default());
        let codec = Arc::new(TokenCodec::new(b"resolver-secret", Duration::minutes(30)));
        (SessionResolver::new(directory.clone(), codec), directory)
    }

    #[tokio::test]
    async fn resolves_the_stored_principal() {
        let (resolver, directory) = resolver();
        let p = principal(Role::Lawyer);
        directory.insert(p.clone(), "advogado123");

        let now = Utc::now();
        let token = resolver.codec().issue(&p, now).unwrap();
        assert_eq!(resolver.resolve(&token, now).await.unwrap(), p);
    }

    #[tokio::test]
    async fn deleted_principal_does_not_resolve() {
        let (resolver, _directory) = resolver();
        let now = Utc::now();
        let token = resolver.codec().issue(&principal(Role::Admin), now).unwrap();

        assert_eq!(
            resolver.resolve(&token, now).await,
            Err(AuthError::Unauthenticated(UnauthenticatedReason::UnknownPrincipal))
        );
    }

    #[tokio::test]
    async fn deactivation_invalidates_existing_tokens() {
        let (resolver, directory) = resolver();
        let p = principal(Role::Admin);
        directory.insert(p.clone(), "admin123");
        let now = Utc::now();
        let token = resolver.codec().issue(&p, now).unwrap();
        assert!(resolver.resolve(&token, now).await.is_ok());

        directory.set_active(p.id, false);
        assert_eq!(
            resolver.resolve(&token, now).await,
            Err(AuthError::Unauthenticated(UnauthenticatedReason::InactivePrincipal))
        );
    }

    #[tokio::test]
    async fn stored_role_wins_over_token_role() {
        let (resolver, directory) = resolver();
        let mut p = principal(Role::Admin);
        directory.insert(p.clone(), "admin123");
        let now = Utc::now();
        let token = resolver.codec().issue(&p, now).unwrap();

        p.role = Role::Assistant;
        directory.insert(p.clone(), "admin123");
        assert_eq!(resolver.resolve(&token, now).await.unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn expired_token_reports_expiry() {
        let (resolver, directory) = resolver();
        let p = principal(Role::Admin);
        directory.insert(p.clone(), "admin123");
        let now = Utc::now();
        let token = resolver.codec().issue(&p, now).unwrap();

        assert_eq!(
            resolver.resolve(&token, now + Duration::minutes(31)).await,
            Err(AuthError::Unauthenticated(UnauthenticatedReason::Token(
                TokenError::ExpiredToken
            )))
        );
    }

    #[tokio::test]
    async fn firm_mismatch_is_rejected() {
        let (resolver, directory) = resolver();
        let p = principal(Role::Admin);
        directory.insert(p.clone(), "admin123");
        let now = Utc::now();

        let mut forged = p.clone();
        forged.firm_id = FirmId::new();
        let token = resolver.codec().issue(&forged, now).unwrap();

        assert_eq!(
            resolver.resolve(&token, now).await,
            Err(AuthError::Unauthenticated(UnauthenticatedReason::FirmMismatch))
        );
    }

    #[tokio::test]
    async fn directory_outage_is_not_a_401() {
        let (resolver, directory) = resolver();
        let p = principal(Role::Admin);
        directory.insert(p.clone(), "admin123");
        let now = Utc::now();
        let token = resolver.codec().issue(&p, now).unwrap();

        *directory.offline.write().unwrap() = true;
        assert!(matches!(
            resolver.resolve(&token, now).await,
            Err(AuthError::Unavailable(_))
        ));
    }
}
