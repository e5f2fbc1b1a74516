//! Configuration management for taskboard.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `PAGE_SIZE` - Optional. Rows per task-list page. Defaults to `10`.
//! - `SEARCH_DELAY_MS` - Optional. Simulated lookup latency. Defaults to `1500`.
//! - `SUBMIT_DELAY_MS` - Optional. Simulated creation latency. Defaults to `2000`.
//! - `TASKS_FILE` - Optional. JSON task fixture replacing the built-in demo dataset.
//! - `DEV_MODE` - Optional. Enables permissive CORS. Defaults to `false`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::query::DEFAULT_PAGE_SIZE;
use crate::util::env_var_bool;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Rows per page in the task list
    pub page_size: usize,

    /// Simulated latency of a task lookup
    pub search_delay: Duration,

    /// Simulated latency of task creation
    pub submit_delay: Duration,

    /// Optional JSON fixture with the task collection
    pub tasks_file: Option<PathBuf>,

    /// Permissive CORS for local front-end development
    pub dev_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            page_size: DEFAULT_PAGE_SIZE,
            search_delay: Duration::from_millis(1500),
            submit_delay: Duration::from_millis(2000),
            tasks_file: None,
            dev_mode: false,
        }
    }
}

/// Parse `name` from the environment, or fall back to `default`.
fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse
    /// or `PAGE_SIZE` is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = env_parse("PORT", defaults.port)?;

        let page_size = env_parse("PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "PAGE_SIZE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let search_delay = Duration::from_millis(env_parse(
            "SEARCH_DELAY_MS",
            defaults.search_delay.as_millis() as u64,
        )?);
        let submit_delay = Duration::from_millis(env_parse(
            "SUBMIT_DELAY_MS",
            defaults.submit_delay.as_millis() as u64,
        )?);

        let tasks_file = std::env::var("TASKS_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            page_size,
            search_delay,
            submit_delay,
            tasks_file,
            dev_mode: env_var_bool("DEV_MODE", false),
        })
    }

    /// Default config without simulated latency (useful for testing).
    pub fn for_tests() -> Self {
        Self {
            search_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
