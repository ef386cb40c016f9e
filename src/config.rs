//! Service configuration
//!
//! Read from the environment (and an optional `.env`), with a logged default
//! for every setting.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// One year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub usda_api_key: Option<String>,
    pub usda_base_url: String,
    pub session_ttl_hours: i64,
    pub default_daily_goal: f64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self {
            port: try_load("CALTRACK_PORT", "5000")?,
            database_path: var("CALTRACK_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            usda_api_key: var("USDA_API_KEY").filter(|k| !k.trim().is_empty()),
            usda_base_url: var("USDA_BASE_URL").unwrap_or_else(|| DEFAULT_USDA_BASE_URL.to_string()),
            session_ttl_hours: try_load("CALTRACK_SESSION_TTL_HOURS", "24")?,
            default_daily_goal: try_load("CALTRACK_DEFAULT_DAILY_GOAL", "2000")?,
        };

        config.validate()?;

        if config.usda_api_key.is_none() {
            warn!("USDA_API_KEY is not set, food search will be unavailable");
        }

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(ConfigError::Invalid {
                key: "CALTRACK_SESSION_TTL_HOURS",
                value: self.session_ttl_hours.to_string(),
                reason: format!("must be between 1 and {MAX_SESSION_TTL_HOURS}"),
            });
        }
        if !(self.default_daily_goal.is_finite() && self.default_daily_goal > 0.0) {
            return Err(ConfigError::Invalid {
                key: "CALTRACK_DEFAULT_DAILY_GOAL",
                value: self.default_daily_goal.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(())
    }

    /// Saturates instead of panicking on an out-of-range hour count
    pub fn session_ttl(&self) -> Duration {
        Duration::try_hours(self.session_ttl_hours).unwrap_or(Duration::MAX)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            database_path: default_database_path(),
            usda_api_key: None,
            usda_base_url: DEFAULT_USDA_BASE_URL.to_string(),
            session_ttl_hours: 24,
            default_daily_goal: 2000.0,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })
}

/// `<project>/data/calorie_tracker.db`, resolved from the executable location
pub fn default_database_path() -> PathBuf {
    let mut path = env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("calorie_tracker.db");
    path
}
