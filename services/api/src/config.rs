//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;
use wordsprout_core::DEFAULT_TRIGGER_TOLERANCE_SEC;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    /// Forward tolerance for checkpoint triggering, in seconds.
    pub checkpoint_tolerance_sec: f64,
    /// Whether the editor rejects checkpoints placed past the lesson end.
    pub enforce_duration_bound: bool,
    /// Escape hatch for auth-provider outages; off outside development.
    pub demo_login_enabled: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        // --- Load Editor Tuning ---
        let checkpoint_tolerance_sec = match std::env::var("CHECKPOINT_TOLERANCE_SEC") {
            Ok(raw) => raw.parse::<f64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "CHECKPOINT_TOLERANCE_SEC".to_string(),
                    format!("'{}' is not a number of seconds", raw),
                )
            })?,
            Err(_) => DEFAULT_TRIGGER_TOLERANCE_SEC,
        };

        let enforce_duration_bound = env_flag("ENFORCE_DURATION_BOUND")?;
        let demo_login_enabled = env_flag("DEMO_LOGIN_ENABLED")?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            checkpoint_tolerance_sec,
            enforce_duration_bound,
            demo_login_enabled,
        })
    }
}

/// Parses an optional boolean flag; absent means `false`.
fn env_flag(name: &str) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => Err(ConfigError::InvalidValue(
                name.to_string(),
                format!("'{}' is not a boolean flag", other),
            )),
        },
        Err(_) => Ok(false),
    }
}
