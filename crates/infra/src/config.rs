//! Process configuration, read once from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::warn;

use juris_auth::{AuthConfig, MAX_ACCESS_TOKEN_LIFETIME_SECS};

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// PostgreSQL pool settings.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl core::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    /// Seed the demo firm on startup.
    pub seed_demo_data: bool,
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match var("ENVIRONMENT").as_deref().map(str::to_ascii_lowercase) {
            None => Environment::Development,
            Some(env) if env == "development" || env == "dev" => Environment::Development,
            Some(env) if env == "production" || env == "prod" => Environment::Production,
            Some(other) => bail!("ENVIRONMENT must be development or production, got '{other}'"),
        };

        let jwt_secret = match var("SECRET_KEY") {
            Some(secret) => secret,
            None if environment.is_development() => {
                warn!("SECRET_KEY not set; using insecure development default");
                DEV_SECRET.to_string()
            }
            None => bail!("SECRET_KEY is required outside development"),
        };

        let expire_minutes: i64 = parse_or(&var, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        if expire_minutes <= 0 {
            bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }
        let access_token_lifetime_secs = match expire_minutes.checked_mul(60) {
            Some(secs) if secs <= MAX_ACCESS_TOKEN_LIFETIME_SECS => secs,
            _ => bail!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be at most {}",
                MAX_ACCESS_TOKEN_LIFETIME_SECS / 60
            ),
        };

        let database = match var("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 20)?,
                acquire_timeout: Duration::from_secs(parse_or(
                    &var,
                    "DATABASE_POOL_TIMEOUT_SECS",
                    30,
                )?),
            }),
            None => None,
        };

        let bind_addr = parse_or(&var, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let seed_demo_data = match var("SEED_DEMO_DATA") {
            Some(flag) => parse_flag(&flag).context("SEED_DEMO_DATA")?,
            None => database.is_none(),
        };

        Ok(Self {
            environment,
            bind_addr,
            seed_demo_data,
            database,
            auth: AuthConfig {
                jwt_secret,
                access_token_lifetime_secs,
                ..AuthConfig::default()
            },
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw.parse().with_context(|| format!("invalid {key}: '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn development_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.database.is_none());
        assert!(config.seed_demo_data);
        assert_eq!(config.auth.access_token_lifetime_secs, 1800);
        assert_eq!(config.auth.jwt_secret, DEV_SECRET);
    }

    #[test]
    fn production_requires_a_secret() {
        assert!(config(&[("ENVIRONMENT", "production")]).is_err());
        let config = config(&[("ENVIRONMENT", "production"), ("SECRET_KEY", "s3cret")]).unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");
    }

    #[test]
    fn database_settings_and_seed_default() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/juris"),
            ("DATABASE_MAX_CONNECTIONS", "5"),
            ("DATABASE_POOL_TIMEOUT_SECS", "2"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "60"),
        ])
        .unwrap();
        let db = config.database.unwrap();
        assert_eq!(db.max_connections, 5);
        assert_eq!(db.acquire_timeout, Duration::from_secs(2));
        assert!(!config.seed_demo_data);
        assert_eq!(config.auth.access_token_lifetime_secs, 3600);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(config(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "soon")]).is_err());
        assert!(config(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "0")]).is_err());
        assert!(config(&[("BIND_ADDR", "nowhere")]).is_err());
        assert!(config(&[("SEED_DEMO_DATA", "maybe")]).is_err());
        assert!(config(&[("ENVIRONMENT", "staging")]).is_err());
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let max_minutes = (MAX_ACCESS_TOKEN_LIFETIME_SECS / 60).to_string();
        let config_at_max = config(&[("ACCESS_TOKEN_EXPIRE_MINUTES", max_minutes.as_str())]).unwrap();
        assert_eq!(
            config_at_max.auth.access_token_lifetime_secs,
            MAX_ACCESS_TOKEN_LIFETIME_SECS
        );

        let too_long = (MAX_ACCESS_TOKEN_LIFETIME_SECS / 60 + 1).to_string();
        assert!(config(&[("ACCESS_TOKEN_EXPIRE_MINUTES", too_long.as_str())]).is_err());

        let overflowing = i64::MAX.to_string();
        assert!(config(&[("ACCESS_TOKEN_EXPIRE_MINUTES", overflowing.as_str())]).is_err());
    }

    #[test]
    fn database_url_is_not_printed() {
        let config = config(&[("DATABASE_URL", "postgres://user:pw@db/juris")]).unwrap();
        assert!(!format!("{config:?}").contains("pw@db"));
    }
}
