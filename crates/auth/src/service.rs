//! Login and token refresh orchestration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    AuthConfig, AuthError, Principal, PrincipalDirectory, SessionResolver, TokenCodec,
    hash_password, normalize_email, verify_password,
};

/// Successful login result.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Signed access token.
    pub access_token: String,
    pub principal: Principal,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Authentication service.
///
/// Generic over the principal directory so the auth layer has no dependency
/// on a storage crate.
pub struct AuthService<D> {
    resolver: SessionResolver<D>,
    codec: Arc<TokenCodec>,
    /// Verified against when the email is unknown, so both failure paths cost
    /// one Argon2 verification.
    decoy_hash: Option<String>,
}

impl<D: PrincipalDirectory> AuthService<D> {
    pub fn new(directory: D, config: &AuthConfig) -> Self {
        let codec = Arc::new(TokenCodec::from_config(config));
        Self {
            resolver: SessionResolver::new(directory, codec.clone()),
            codec,
            decoy_hash: hash_password("decoy-password-for-unknown-emails").ok(),
        }
    }

    pub fn resolver(&self) -> &SessionResolver<D> {
        &self.resolver
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        self.resolver.resolve(token, now).await
    }

    /// Authenticate with email + password and issue an access token.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(email);
        let record = self
            .resolver
            .directory()
            .find_principal_by_email(&email)
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let Some(record) = record else {
            if let Some(decoy) = &self.decoy_hash {
                let _ = verify_password(password, decoy);
            }
            warn!("login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &record.password_hash) {
            warn!(user_id = %record.principal.id, "login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !record.principal.is_active {
            warn!(user_id = %record.principal.id, "login refused: inactive account");
            return Err(AuthError::InactiveAccount);
        }

        let access_token = self.issue(&record.principal, now)?;
        info!(
            user_id = %record.principal.id,
            firm_id = %record.principal.firm_id,
            role = %record.principal.role,
            "login succeeded"
        );

        Ok(LoginOutcome {
            access_token,
            principal: record.principal,
            expires_in: self.codec.ttl().num_seconds(),
        })
    }

    /// Issue a fresh token for an already resolved principal.
    pub fn refresh(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.issue(principal, now)
    }

    fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.codec
            .issue(principal, now)
            .map_err(|e| AuthError::Crypto(e.to_string()))
    }
}
