//! Configuration module for the File Library backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared admin key guarding upload and delete
    pub admin_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// JSON file imported when the database is empty
    pub seed_path: Option<PathBuf>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Artificial latency applied before an upload is accepted
    pub submit_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_key = lookup("FILELIB_ADMIN_KEY").filter(|k| !k.is_empty());

        let db_path = lookup("FILELIB_DB_PATH")
            .unwrap_or_else(|| "./data/filelib.sqlite".to_string())
            .into();

        let seed_path = lookup("FILELIB_SEED_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let raw_addr = lookup("FILELIB_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid FILELIB_BIND_ADDR: {}", raw_addr)))?;

        let log_level = lookup("FILELIB_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let submit_delay = match lookup("FILELIB_SUBMIT_DELAY_MS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                AppError::Config(format!("Invalid FILELIB_SUBMIT_DELAY_MS: {}", raw))
            })?,
            None => Duration::ZERO,
        };

        Ok(Self {
            admin_key,
            db_path,
            seed_path,
            bind_addr,
            log_level,
            submit_delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert!(config.admin_key.is_none());
        assert!(config.seed_path.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/filelib.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.submit_delay, Duration::ZERO);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("FILELIB_ADMIN_KEY", "s3cret"),
            ("FILELIB_SEED_PATH", "./data/seed.json"),
            ("FILELIB_BIND_ADDR", "0.0.0.0:9000"),
            ("FILELIB_SUBMIT_DELAY_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.admin_key.as_deref(), Some("s3cret"));
        assert_eq!(config.seed_path, Some(PathBuf::from("./data/seed.json")));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.submit_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_empty_admin_key_is_unset() {
        let config = Config::from_lookup(lookup_from(&[("FILELIB_ADMIN_KEY", "")])).unwrap();
        assert!(config.admin_key.is_none());
    }

    #[test]
    fn test_malformed_values_are_errors() {
        let err = Config::from_lookup(lookup_from(&[("FILELIB_BIND_ADDR", "nowhere")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("FILELIB_SUBMIT_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
