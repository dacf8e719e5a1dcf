//! Process settings from the environment (after `dotenvy`).

use crate::error::ConfigError;
use crate::store::DEFAULT_STORE_SCHEMA;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    /// Empty or unset: the host may fall back to an in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub body_limit: usize,
    /// PostgreSQL schema holding collection tables.
    pub store_schema: String,
    pub services_path: Option<PathBuf>,
}

impl Settings {
    /// `DATABASE_URL`, `BIND_ADDR`, `BODY_LIMIT_BYTES`, `AUTOREST_SCHEMA`, `SERVICES_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
            .parse()
            .map_err(|e| ConfigError::Settings(format!("BIND_ADDR: {}", e)))?;
        let body_limit = match get("BODY_LIMIT_BYTES") {
            Some(v) => v
                .parse()
                .map_err(|e| ConfigError::Settings(format!("BODY_LIMIT_BYTES: {}", e)))?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(Settings {
            database_url: get("DATABASE_URL"),
            bind_addr,
            body_limit,
            store_schema: get("AUTOREST_SCHEMA").unwrap_or_else(|| DEFAULT_STORE_SCHEMA.into()),
            services_path: get("SERVICES_PATH").map(PathBuf::from),
        })
    }
}
