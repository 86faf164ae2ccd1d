use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_COORDINATES_PATH, DEFAULT_HTTP_BIND_ADDR, YANDEX_WEATHER_URL,
};

/// Every problem found while reading the environment
#[derive(Debug, Error)]
#[error("invalid configuration: {}", .0.join("; "))]
pub struct ConfigError(pub Vec<String>);

/// Service settings. `main` loads `.env` before reading them.
#[derive(Debug, Clone)]
pub struct Config {
    pub weather_url: String,
    pub weather_api_key: String,
    pub cache_ttl: Duration,
    pub coordinates_path: PathBuf,
    /// Telegram token; the bot does not start without one.
    pub bot_token: Option<String>,
    pub http_bind_addr: SocketAddr,
}

impl Config {
    /// Reads the config from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Every invalid setting is
    /// reported, not just the first.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut issues = Vec::new();

        let weather_api_key = var("YANDEX_WEATHER_API_KEY").unwrap_or_else(|| {
            issues.push("YANDEX_WEATHER_API_KEY is required".to_string());
            String::new()
        });

        let cache_ttl_secs = match var("WEATHER_CACHE_TTL_SECS") {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                issues.push("WEATHER_CACHE_TTL_SECS must be an integer >= 0".to_string());
                DEFAULT_CACHE_TTL_SECS
            }),
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let bind_raw = var("HTTP_BIND_ADDR").unwrap_or_else(|| DEFAULT_HTTP_BIND_ADDR.to_string());
        let http_bind_addr = bind_raw.parse::<SocketAddr>().ok();
        if http_bind_addr.is_none() {
            issues.push(format!("HTTP_BIND_ADDR is not a socket address: {bind_raw}"));
        }

        match http_bind_addr {
            Some(http_bind_addr) if issues.is_empty() => Ok(Self {
                weather_url: var("YANDEX_WEATHER_URL")
                    .unwrap_or_else(|| YANDEX_WEATHER_URL.to_string()),
                weather_api_key,
                cache_ttl: Duration::from_secs(cache_ttl_secs),
                coordinates_path: var("COORDINATES_PATH")
                    .unwrap_or_else(|| DEFAULT_COORDINATES_PATH.to_string())
                    .into(),
                bot_token: var("BOT_TOKEN"),
                http_bind_addr,
            }),
            _ => Err(ConfigError(issues)),
        }
    }
}
