//! Environment configuration.
//!
//! | variable | default |
//! |---|---|
//! | `USE_PERSISTENT_STORES` | `false` (in-memory store) |
//! | `DATABASE_URL` | required when persistent |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `DB_MIN_CONNECTIONS` | `1` |
//! | `DB_ACQUIRE_TIMEOUT_MS` | `3000` |
//! | `STORE_TIMEOUT_MS` | `5000` |
//! | `HTTP_ADDR` | `0.0.0.0:8080` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key}: invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// `Some` when `USE_PERSISTENT_STORES=true`.
    pub database: Option<DatabaseConfig>,
    /// Upper bound on any single engine store call.
    pub store_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let use_persistent: bool = parse_or(&lookup, "USE_PERSISTENT_STORES", false)?;

        let database = if use_persistent {
            let url = lookup("DATABASE_URL")
                .filter(|u| !u.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10u32)?;
            let min_connections = parse_or(&lookup, "DB_MIN_CONNECTIONS", 1u32)?;
            if min_connections > max_connections {
                return Err(ConfigError::Invalid {
                    key: "DB_MIN_CONNECTIONS",
                    value: min_connections.to_string(),
                    reason: format!("exceeds DB_MAX_CONNECTIONS ({max_connections})"),
                });
            }
            Some(DatabaseConfig {
                url,
                max_connections,
                min_connections,
                acquire_timeout: Duration::from_millis(parse_or(
                    &lookup,
                    "DB_ACQUIRE_TIMEOUT_MS",
                    3000u64,
                )?),
            })
        } else {
            None
        };

        Ok(Self {
            server: ServerConfig {
                addr: parse_or(&lookup, "HTTP_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            },
            database,
            store_timeout: Duration::from_millis(parse_or(&lookup, "STORE_TIMEOUT_MS", 5000u64)?),
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
