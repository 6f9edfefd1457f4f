use crate::constants::{self, env_vars, retry};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub mod paths;
pub mod validation;

use paths::{get_config_path, get_log_dir_path};
use validation::validate_config;

/// Configuration structure for the ETL.
/// Handles loading, saving, and managing run settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Host of the statistics API, without scheme (e.g. `stats.nba.com`).
    #[serde(default = "default_api_host")]
    pub api_host: String,
    /// Send requests over plain http. Only meant for local mock servers.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub plain_http: bool,
    /// Path to the log file. If not specified, logs go to the default log directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// HTTP timeout in seconds for a single request attempt.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Size of the season worker pool.
    #[serde(default = "default_max_concurrent_seasons")]
    pub max_concurrent_seasons: usize,
    /// How long a 429 suspends new attempts in every worker. 0 disables the cooldown.
    #[serde(default = "default_rate_limit_cooldown")]
    pub rate_limit_cooldown_seconds: u64,
    /// Base backoff delay; attempt i waits `base << i`.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_seconds: u64,
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_host() -> String {
    constants::DEFAULT_API_HOST.to_string()
}

fn default_http_timeout() -> u64 {
    constants::DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_max_concurrent_seasons() -> usize {
    constants::DEFAULT_MAX_CONCURRENT_SEASONS
}

fn default_rate_limit_cooldown() -> u64 {
    retry::RATE_LIMIT_COOLDOWN_SECONDS
}

fn default_retry_base_delay() -> u64 {
    retry::BASE_DELAY_SECONDS
}

fn default_max_retries() -> u32 {
    retry::MAX_RETRIES
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_host: default_api_host(),
            plain_http: false,
            log_file_path: None,
            http_timeout_seconds: default_http_timeout(),
            max_concurrent_seasons: default_max_concurrent_seasons(),
            rate_limit_cooldown_seconds: default_rate_limit_cooldown(),
            retry_base_delay_seconds: default_retry_base_delay(),
            max_retries: default_max_retries(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    /// A missing file yields the defaults; the ETL runs unattended and never prompts.
    ///
    /// # Environment Variables
    /// - `BBALL_API_HOST` - Override API host
    /// - `BBALL_LOG_FILE` - Override log file path
    /// - `BBALL_HTTP_TIMEOUT` - Override HTTP timeout in seconds
    /// - `BBALL_MAX_WORKERS` - Override the season worker pool size
    ///
    /// # Returns
    /// * `Ok(Config)` - Loaded and validated configuration
    /// * `Err(AppError)` - Unreadable file, bad TOML, or failed validation
    pub async fn load() -> Result<Self, AppError> {
        let config_path = get_config_path();

        let mut config = if Path::new(&config_path).exists() {
            Self::load_from_path(&config_path).await?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Applies `BBALL_*` environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_host) = std::env::var(env_vars::API_HOST) {
            self.api_host = api_host;
        }

        if let Ok(log_file_path) = std::env::var(env_vars::LOG_FILE) {
            self.log_file_path = Some(log_file_path);
        }

        if let Some(timeout) = std::env::var(env_vars::HTTP_TIMEOUT)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.http_timeout_seconds = timeout;
        }

        if let Some(workers) = std::env::var(env_vars::MAX_WORKERS)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            self.max_concurrent_seasons = workers;
        }
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(self)
    }

    /// Backoff base as a `Duration`
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_secs(self.retry_base_delay_seconds)
    }

    /// Cooldown after a 429, `None` when disabled
    pub fn rate_limit_cooldown(&self) -> Option<Duration> {
        (self.rate_limit_cooldown_seconds > 0)
            .then(|| Duration::from_secs(self.rate_limit_cooldown_seconds))
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    /// Returns the platform-specific path for the log directory.
    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Displays the effective configuration to stdout.
    pub fn display(&self) {
        let config_path = get_config_path();
        let log_dir = get_log_dir_path();

        println!("\nCurrent Configuration");
        println!("────────────────────────────────────");
        println!("Config Location:");
        if Path::new(&config_path).exists() {
            println!("{config_path}");
        } else {
            println!("{config_path} (not found, using defaults)");
        }
        println!("────────────────────────────────────");
        println!("API Host:");
        let scheme = if self.plain_http { "http" } else { "https" };
        println!("{scheme}://{}", self.api_host);
        println!("────────────────────────────────────");
        println!("HTTP Timeout:");
        println!("{} seconds", self.http_timeout_seconds);
        println!("────────────────────────────────────");
        println!("Season Workers:");
        println!("{}", self.max_concurrent_seasons);
        println!("────────────────────────────────────");
        println!("Retries / Backoff / Cooldown:");
        println!(
            "{} retries, {}s base delay, {}s cooldown after 429",
            self.max_retries, self.retry_base_delay_seconds, self.rate_limit_cooldown_seconds
        );
        println!("────────────────────────────────────");
        println!("Log File Location:");
        if let Some(custom_path) = &self.log_file_path {
            println!("{custom_path}");
        } else {
            println!("{log_dir}");
            println!("(Default location)");
        }
    }

    /// Saves configuration to the given file path, creating the parent directory.
    ///
    /// # Errors
    /// * `AppError::Config` - If the provided path has no parent directory
    /// * `AppError::Io` - If creating directories or writing the file fails
    /// * `AppError::TomlSerialize` - If serializing the configuration fails
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }

        let content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Loads configuration from a custom file path without env overrides.
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
