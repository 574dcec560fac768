//! API server configuration module.
//!
//! Configuration is loaded from environment variables (and `.env`, when
//! present) with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use rxdict_core::DEFAULT_MAX_FIELD_LENGTH;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Address to bind
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub max_connections: u32,

    /// Milliseconds SQLite waits on a locked database
    pub busy_timeout_ms: u64,

    /// Maximum characters per field on create, update and import
    pub max_field_length: usize,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ApiConfig {
            http_port: parse_or(&lookup, "RXDICT_HTTP_PORT", 8000)?,

            bind_addr: lookup("RXDICT_BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),

            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./drug_dictionary.db")),

            max_connections: parse_or(&lookup, "RXDICT_MAX_CONNECTIONS", 5)?,

            busy_timeout_ms: parse_or(&lookup, "RXDICT_BUSY_TIMEOUT_MS", 5000)?,

            max_field_length: parse_or(&lookup, "RXDICT_MAX_FIELD_LENGTH", DEFAULT_MAX_FIELD_LENGTH)?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("RXDICT_MAX_CONNECTIONS".to_string()));
        }
        if config.max_field_length == 0 {
            return Err(ConfigError::InvalidValue("RXDICT_MAX_FIELD_LENGTH".to_string()));
        }

        Ok(config)
    }

    /// Returns the `host:port` string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
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
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.database_path, PathBuf::from("./drug_dictionary.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.max_field_length, 255);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("RXDICT_HTTP_PORT", "9090"),
            ("RXDICT_BIND_ADDR", "127.0.0.1"),
            ("DATABASE_PATH", "/var/lib/rxdict/dict.db"),
            ("RXDICT_MAX_FIELD_LENGTH", "100"),
            ("RXDICT_BUSY_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.database_path, PathBuf::from("/var/lib/rxdict/dict.db"));
        assert_eq!(config.max_field_length, 100);
    }

    #[test]
    fn test_invalid_port() {
        let err = ApiConfig::from_lookup(lookup(&[("RXDICT_HTTP_PORT", "eighty")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for RXDICT_HTTP_PORT");
    }

    #[test]
    fn test_zero_pool_is_rejected() {
        assert!(ApiConfig::from_lookup(lookup(&[("RXDICT_MAX_CONNECTIONS", "0")])).is_err());
    }
}
