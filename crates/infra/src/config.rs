//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

const DEV_JWT_SECRET: &str = "jobgate-dev-secret-do-not-deploy";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set outside development")]
    MissingSecret,

    #[error("APP_ENV must be 'development' or 'production', got '{0}'")]
    InvalidEnvironment(String),

    #[error("invalid BIND_ADDR '{0}'")]
    InvalidBindAddr(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub jwt_secret: String,
    /// Postgres URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("environment", &self.environment)
            .field("jwt_secret", &"<redacted>")
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("APP_ENV") {
            Some(raw) => Environment::parse(&raw)?,
            None => Environment::Production,
        };

        let jwt_secret = match (get("JWT_SECRET"), environment) {
            (Some(secret), _) => secret,
            (None, Environment::Development) => {
                warn!("JWT_SECRET not set; using the built-in development secret");
                DEV_JWT_SECRET.to_string()
            }
            (None, Environment::Production) => return Err(ConfigError::MissingSecret),
        };

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr.clone()))?;

        Ok(Self {
            environment,
            jwt_secret,
            database_url: get("DATABASE_URL"),
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn production_requires_a_secret() {
        assert_eq!(AppConfig::from_lookup(lookup(&[])).unwrap_err(), ConfigError::MissingSecret);
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("APP_ENV", "production"), ("JWT_SECRET", "  ")])).unwrap_err(),
            ConfigError::MissingSecret
        );
    }

    #[test]
    fn development_falls_back_to_builtin_secret() {
        let config = AppConfig::from_lookup(lookup(&[("APP_ENV", "Development")])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert!(config.database_url.is_none());
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn explicit_values_win() {
        let config = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/jobs"),
            ("BIND_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/jobs"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("APP_ENV", "staging")])).unwrap_err(),
            ConfigError::InvalidEnvironment("staging".to_string())
        );
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("JWT_SECRET", "x"), ("BIND_ADDR", "nope")])).unwrap_err(),
            ConfigError::InvalidBindAddr(_)
        ));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
