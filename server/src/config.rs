use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::auth::DEFAULT_TOKEN_TTL_DAYS;

/// Runtime configuration, read once at startup and carried in the app state.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub media_root: PathBuf,
    pub token_ttl_days: i64,
}

impl Config {
    /// Load configuration from the environment, after applying any `.env` file.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            debug!("No .env file loaded: {e}");
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", "recipes.db")?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            media_root: try_load::<String>("MEDIA_ROOT", "media")?.into(),
            token_ttl_days: try_load("TOKEN_TTL_DAYS", &DEFAULT_TOKEN_TTL_DAYS.to_string())?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        anyhow!("Environment variable {key} is misconfigured: {e}")
    })
}
