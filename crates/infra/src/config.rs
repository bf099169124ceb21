//! Runtime configuration loaded from the environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_DEDUCTION_RETRIES: u32 = 5;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("USE_PERSISTENT_STORES is set but DATABASE_URL is missing")]
    MissingDatabaseUrl,
}

/// Knobs of the batch ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How many times a deduction re-reads and re-plans after losing a race.
    pub max_deduction_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_deduction_retries: DEFAULT_MAX_DEDUCTION_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Set when the Postgres store should be used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub ledger: LedgerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;

        let persistent = lookup("USE_PERSISTENT_STORES")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let database_url = match (persistent, database_url) {
            (true, None) => return Err(ConfigError::MissingDatabaseUrl),
            (true, url) => url,
            (false, _) => None,
        };

        let db_max_connections = parse_or(
            "DB_MAX_CONNECTIONS",
            lookup("DB_MAX_CONNECTIONS"),
            Some(DEFAULT_DB_MAX_CONNECTIONS),
        )?;
        let max_deduction_retries = parse_or(
            "MAX_DEDUCTION_RETRIES",
            lookup("MAX_DEDUCTION_RETRIES"),
            Some(DEFAULT_MAX_DEDUCTION_RETRIES),
        )?;

        Ok(Self {
            bind_addr,
            database_url,
            db_max_connections,
            ledger: LedgerConfig { max_deduction_retries },
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        None => default.ok_or(ConfigError::Invalid {
            key,
            value: String::new(),
            reason: "no default".to_string(),
        }),
    }
}
