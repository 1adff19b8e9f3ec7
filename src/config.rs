use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while reading the environment
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: String, reason: String },
}

/// Runtime settings of the dashboard server
///
/// Every value comes from the environment (a `.env` file is honoured by
/// `main`), with defaults suited to local development against a backend on
/// port 3001.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend REST API, without trailing slash
    pub api_url: String,

    /// Interface the server binds to
    pub host: String,

    /// Port the server listens on
    pub port: u16,

    /// Marks cookies `Secure` when running in production
    pub production: bool,

    /// Lifetime of the `auth_token` cookie in days
    pub session_days: i64,

    /// Idle time after which a staff session is logged out
    pub inactivity_minutes: i64,

    /// Timeout applied to every backend request
    pub backend_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            production: false,
            session_days: 7,
            inactivity_minutes: 30,
            backend_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = var("API_URL")
            .or_else(|_| var("NEXT_PUBLIC_API_URL"))
            .unwrap_or_else(|_| {
                info!("API_URL not set, using default: {}", defaults.api_url);
                defaults.api_url.clone()
            });

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            host: try_load("HOST", defaults.host)?,
            port: try_load("PORT", defaults.port)?,
            production: var("APP_ENV").is_ok_and(|env| env.eq_ignore_ascii_case("production")),
            session_days: try_load("SESSION_DAYS", defaults.session_days)?,
            inactivity_minutes: try_load("INACTIVITY_MINUTES", defaults.inactivity_minutes)?,
            backend_timeout_secs: try_load("BACKEND_TIMEOUT_SECS", defaults.backend_timeout_secs)?,
        })
    }

    /// Socket address string for the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| ())
}

fn try_load<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
