//! Runtime configuration read from the environment

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database_max_connections: u32,
    pub default_daily_goal_minutes: u32,
}

impl Config {
    /// Load configuration after applying any `.env` file.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Config("DATABASE_URL must be set".to_string()))?;

        let host = lookup("HOST")
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(10);

        let default_daily_goal_minutes = lookup("DEFAULT_DAILY_GOAL_MINUTES")
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(15);

        Ok(Self {
            database_url,
            host,
            port,
            log_level,
            database_max_connections,
            default_daily_goal_minutes,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
