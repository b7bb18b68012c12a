use chrono_tz::Tz;
use std::net::SocketAddr;

use crate::error::{AppError, AppResult};

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Havana;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreKind,
    pub redis_url: String,
    pub timezone: Tz,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("PORT", "3000");
        let port = port
            .parse()
            .map_err(|_| AppError::Config(format!("PORT must be a port number, got {port:?}")))?;

        let store = match var("STORE", "redis").to_ascii_lowercase().as_str() {
            "redis" => StoreKind::Redis,
            "memory" => StoreKind::Memory,
            other => {
                return Err(AppError::Config(format!(
                    "STORE must be \"redis\" or \"memory\", got {other:?}"
                )))
            }
        };

        let timezone = match lookup("RESTAURANT_TIMEZONE") {
            Some(name) => name
                .parse()
                .map_err(|_| AppError::Config(format!("unknown time zone {name:?}")))?,
            None => DEFAULT_TIMEZONE,
        };

        Ok(Self {
            host: var("HOST", "127.0.0.1"),
            port,
            store,
            redis_url: var("REDIS_URL", "redis://127.0.0.1/"),
            timezone,
        })
    }

    pub fn addr(&self) -> AppResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| AppError::Config(format!("invalid listen address {}:{}", self.host, self.port)))
    }
}
