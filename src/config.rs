//! Configuration loaded from environment variables with sensible defaults.

use std::env;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Absent means the process keeps its state in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_number("PORT", non_empty("PORT"), 8083)?,
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: parse_number("DATABASE_MAX_CONNECTIONS", non_empty("DATABASE_MAX_CONNECTIONS"), 10)?,
            nats_url: non_empty("NATS_URL"),
        })
    }

    pub fn bind_address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}
