use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use juris_core::{FirmId, UserId};

use crate::{Principal, Role, TokenError};

/// Claims carried by an access token.
///
/// Timestamps are unix seconds, as in any JWT. `sub`, `firm_id`, `email` and
/// `role` are required: a token missing any of them does not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Firm the subject belongs to.
    pub firm_id: FirmId,

    pub email: String,

    pub role: Role,

    /// Display name, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Issued-at.
    pub iat: i64,

    /// Expiration.
    pub exp: i64,
}

impl Claims {
    /// Claims for `principal`, valid from `now` for `ttl`.
    pub fn issue(principal: &Principal, now: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = now.timestamp();
        Self {
            sub: principal.id,
            firm_id: principal.firm_id,
            email: principal.email.clone(),
            role: principal.role,
            name: Some(principal.name.clone()),
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Deterministically validate the time window of already-verified claims.
///
/// Expiry wins: once `now >= exp` the token is expired, whatever its `iat`.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if now.timestamp() >= claims.exp {
        return Err(TokenError::ExpiredToken);
    }
    if claims.exp <= claims.iat {
        return Err(TokenError::InvalidToken(
            "invalid time window (exp <= iat)".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: UserId::new(),
            firm_id: FirmId::new(),
            name: "Ana".into(),
            email: "ana@firm.com".into(),
            role: Role::Lawyer,
            is_active: true,
        }
    }

    #[test]
    fn issue_sets_expiry_from_ttl() {
        let now = Utc::now();
        let claims = Claims::issue(&principal(), now, Duration::minutes(30));
        assert_eq!(claims.exp - claims.iat, 1800);
        assert_eq!(claims.issued_at().unwrap().timestamp(), now.timestamp());
    }

    #[test]
    fn expired_exactly_at_exp() {
        let now = Utc::now();
        let claims = Claims::issue(&principal(), now, Duration::seconds(10));
        assert!(validate_claims(&claims, now + Duration::seconds(9)).is_ok());
        assert_eq!(
            validate_claims(&claims, now + Duration::seconds(10)),
            Err(TokenError::ExpiredToken)
        );
    }

    #[test]
    fn empty_window_is_expired_once_past_exp() {
        let now = Utc::now();
        let claims = Claims::issue(&principal(), now, Duration::zero());
        assert_eq!(validate_claims(&claims, now), Err(TokenError::ExpiredToken));
        assert_eq!(
            validate_claims(&claims, now + Duration::hours(1)),
            Err(TokenError::ExpiredToken)
        );
    }

    #[test]
    fn inverted_window_before_exp_is_invalid() {
        let mut claims = Claims::issue(&principal(), Utc::now(), Duration::hours(1));
        claims.iat = claims.exp + 60;
        let before_exp = claims.expires_at().unwrap() - Duration::minutes(5);
        assert!(matches!(
            validate_claims(&claims, before_exp),
            Err(TokenError::InvalidToken(_))
        ));
    }
}
