use std::env;
use std::time::Duration;

use crate::metadata::{METADATA_FETCH_TIMEOUT, TITLE_FETCH_TIMEOUT};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    /// Anything other than `APP_ENV=production`.
    pub is_dev: bool,
    pub metadata_fetch_timeout: Duration,
    pub title_fetch_timeout: Duration,
    /// `ALLOW_PRIVATE_NETWORKS=true` lets the fetcher reach private and
    /// loopback addresses. Off unless set.
    pub allow_private_networks: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev_secret_change_in_production".to_string()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            is_dev: env::var("APP_ENV").as_deref() != Ok("production"),
            metadata_fetch_timeout: secs_from_env(
                "METADATA_FETCH_TIMEOUT_SECS",
                METADATA_FETCH_TIMEOUT,
            ),
            title_fetch_timeout: secs_from_env("TITLE_FETCH_TIMEOUT_SECS", TITLE_FETCH_TIMEOUT),
            allow_private_networks: flag_from_env("ALLOW_PRIVATE_NETWORKS"),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Whole seconds from `key`; unset, unparsable or zero falls back to `default`.
fn secs_from_env(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn flag_from_env(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
