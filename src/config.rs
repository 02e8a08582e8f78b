//! Process configuration read from the environment (after `.env` is loaded).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Where apartment records live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub db_schema: String,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    pub store_backend: StoreBackend,
    pub bind_addr: SocketAddr,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset and blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let db_schema = get("DB_SCHEMA").unwrap_or_else(|| "public".into());
        if !is_identifier(&db_schema) {
            return Err(ConfigError::Invalid {
                key: "DB_SCHEMA",
                message: format!("'{}' is not a plain identifier", db_schema),
            });
        }
        let db_max_connections: u32 = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                message: "must be at least 1".into(),
            });
        }
        let timeout_secs: u64 = parse_or("DB_CONNECT_TIMEOUT_SECS", get("DB_CONNECT_TIMEOUT_SECS"), 10)?;
        let store_backend = match get("STORE_BACKEND") {
            Some(v) => v.parse()?,
            None => StoreBackend::Postgres,
        };
        let bind_addr = parse_or(
            "BIND_ADDR",
            get("BIND_ADDR"),
            SocketAddr::from(([0, 0, 0, 0], 3000)),
        )?;
        let cors_origins = get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let body_limit_bytes = parse_or("BODY_LIMIT_BYTES", get("BODY_LIMIT_BYTES"), 1024 * 1024)?;

        Ok(AppConfig {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/apartments".into()),
            db_schema,
            db_max_connections,
            db_connect_timeout: Duration::from_secs(timeout_secs),
            store_backend,
            bind_addr,
            cors_origins,
            body_limit_bytes,
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("'{}': {}", v, e),
        }),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = from(&[]).unwrap();
        assert_eq!(c.database_url, "postgres://localhost/apartments");
        assert_eq!(c.db_schema, "public");
        assert_eq!(c.db_max_connections, 5);
        assert_eq!(c.db_connect_timeout, Duration::from_secs(10));
        assert_eq!(c.store_backend, StoreBackend::Postgres);
        assert_eq!(c.bind_addr.to_string(), "0.0.0.0:3000");
        assert!(c.cors_origins.is_empty());
        assert_eq!(c.body_limit_bytes, 1_048_576);
    }

    #[test]
    fn reads_overrides() {
        let c = from(&[
            ("STORE_BACKEND", "Memory"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("DB_SCHEMA", "rentals"),
        ])
        .unwrap();
        assert_eq!(c.store_backend, StoreBackend::Memory);
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(c.db_schema, "rentals");
    }

    #[test]
    fn blank_values_fall_back() {
        let c = from(&[("DB_MAX_CONNECTIONS", "  "), ("STORE_BACKEND", "")]).unwrap();
        assert_eq!(c.db_max_connections, 5);
        assert_eq!(c.store_backend, StoreBackend::Postgres);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_matches!(from(&[("DB_MAX_CONNECTIONS", "many")]), Err(ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", .. }));
        assert_matches!(from(&[("DB_MAX_CONNECTIONS", "0")]), Err(ConfigError::Invalid { .. }));
        assert_matches!(from(&[("BIND_ADDR", "localhost")]), Err(ConfigError::Invalid { key: "BIND_ADDR", .. }));
        assert_matches!(from(&[("DB_SCHEMA", "public; drop")]), Err(ConfigError::Invalid { key: "DB_SCHEMA", .. }));
        assert_matches!(from(&[("STORE_BACKEND", "redis")]), Err(ConfigError::UnknownBackend(_)));
    }
}
