//! # Database Configuration
//!
//! Pool and statement settings, built in code or loaded from the environment.
//!
//! ## Environment
//! ```text
//! ┌──────────────────────────────┬──────────┬──────────────────────────────┐
//! │ Variable                     │ Default  │ Meaning                      │
//! ├──────────────────────────────┼──────────┼──────────────────────────────┤
//! │ DB_NAME                      │ required │ SQLite file path or :memory: │
//! │ DB_MAX_CONNECTIONS           │ 5        │ Pool upper bound             │
//! │ DB_MIN_CONNECTIONS           │ 1        │ Connections kept warm        │
//! │ DB_ACQUIRE_TIMEOUT_SECS      │ 30       │ Wait for a free connection   │
//! │ DB_STATEMENT_TIMEOUT_SECS    │ 10       │ Per-statement deadline       │
//! └──────────────────────────────┴──────────┴──────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Environment variable names.
pub mod env_keys {
    pub const DB_NAME: &str = "DB_NAME";
    pub const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
    pub const DB_MIN_CONNECTIONS: &str = "DB_MIN_CONNECTIONS";
    pub const DB_ACQUIRE_TIMEOUT_SECS: &str = "DB_ACQUIRE_TIMEOUT_SECS";
    pub const DB_STATEMENT_TIMEOUT_SECS: &str = "DB_STATEMENT_TIMEOUT_SECS";
}

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use sms_db::DbConfig;
///
/// let config = DbConfig::new("/var/lib/sms/store.db")
///     .max_connections(5)
///     .statement_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.max_connections, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a pooled connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Deadline for a single statement.
    /// Default: 10 seconds
    pub statement_timeout: Duration,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`.
    ///
    /// The file is created on first connect if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            statement_timeout: Duration::from_secs(10),
        }
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Every `Database` built from this config gets its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            statement_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-statement timeout.
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// True when the path selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// ## Rules
    /// - `DB_NAME` is required and must not be blank
    /// - Numeric settings fall back to defaults when unset
    /// - `DB_MIN_CONNECTIONS` must not exceed `DB_MAX_CONNECTIONS`
    ///
    /// ## Example
    /// ```rust
    /// use sms_db::DbConfig;
    ///
    /// let config = DbConfig::from_lookup(|key| match key {
    ///     "DB_NAME" => Some("store.db".to_string()),
    ///     "DB_MAX_CONNECTIONS" => Some("8".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.max_connections, 8);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup(env_keys::DB_NAME)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired(env_keys::DB_NAME.to_string()))?;

        let mut config = if name == IN_MEMORY {
            DbConfig::in_memory()
        } else {
            DbConfig::new(name)
        };

        if let Some(max) = parse_var(&lookup, env_keys::DB_MAX_CONNECTIONS)? {
            config.max_connections = max;
        }
        if let Some(min) = parse_var(&lookup, env_keys::DB_MIN_CONNECTIONS)? {
            config.min_connections = min;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, env_keys::DB_ACQUIRE_TIMEOUT_SECS)? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, env_keys::DB_STATEMENT_TIMEOUT_SECS)? {
            config.statement_timeout = Duration::from_secs(secs);
        }

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                env_keys::DB_MAX_CONNECTIONS.to_string(),
            ));
        }
        if config.min_connections > config.max_connections {
            return Err(ConfigError::InvalidValue(
                env_keys::DB_MIN_CONNECTIONS.to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(None),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .statement_timeout(Duration::from_secs(3));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.statement_timeout, Duration::from_secs(3));
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_defaults_from_lookup() {
        let config = DbConfig::from_lookup(lookup_from(&[("DB_NAME", "store.db")])).unwrap();

        assert_eq!(config.database_path, PathBuf::from("store.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.statement_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("DB_NAME", ":memory:"),
            ("DB_MAX_CONNECTIONS", "1"),
            ("DB_STATEMENT_TIMEOUT_SECS", " 2 "),
        ]))
        .unwrap();

        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.statement_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_missing_name() {
        assert_eq!(
            DbConfig::from_lookup(lookup_from(&[])).unwrap_err(),
            ConfigError::MissingRequired("DB_NAME".to_string())
        );
        assert_eq!(
            DbConfig::from_lookup(lookup_from(&[("DB_NAME", "  ")])).unwrap_err(),
            ConfigError::MissingRequired("DB_NAME".to_string())
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("DB_NAME", "store.db"),
            ("DB_MAX_CONNECTIONS", "five"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));

        let err = DbConfig::from_lookup(lookup_from(&[
            ("DB_NAME", "store.db"),
            ("DB_MAX_CONNECTIONS", "2"),
            ("DB_MIN_CONNECTIONS", "3"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue("DB_MIN_CONNECTIONS".to_string()));

        let err = DbConfig::from_lookup(lookup_from(&[
            ("DB_NAME", "store.db"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("DB_MIN_CONNECTIONS", "0"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
    }
}
