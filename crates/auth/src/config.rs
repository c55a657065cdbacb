//! Authentication configuration.

/// Longest access token lifetime accepted: 30 days.
pub const MAX_ACCESS_TOKEN_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

/// Configuration for token issuance and credential policy.
///
/// Built once at process start and handed to [`crate::TokenCodec`] and
/// [`crate::AuthService`]; nothing in this crate reads the environment.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify HS256 access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 1800 = 30 minutes, at most
    /// [`MAX_ACCESS_TOKEN_LIFETIME_SECS`]).
    pub access_token_lifetime_secs: i64,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_lifetime_secs: 1800,
            min_password_length: 6,
        }
    }
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_lifetime_secs", &self.access_token_lifetime_secs)
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_the_secret() {
        let config = AuthConfig {
            jwt_secret: "super-secret-value".into(),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("1800"));
    }
}
