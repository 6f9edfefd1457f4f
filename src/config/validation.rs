use super::Config;
use crate::constants::retry::{MAX_DELAY_SECONDS, MAX_RETRIES_LIMIT};
use crate::error::AppError;

/// Validates the configuration settings
///
/// # Validation Rules
/// - API host cannot be empty and must not carry a scheme
/// - The worker pool needs at least one worker
/// - HTTP timeout must be positive
/// - Retries are capped at 10, backoff base and cooldown at one hour
/// - If log file path is provided, it cannot be empty
pub fn validate_config(config: &Config) -> Result<(), AppError> {
    let host = config.api_host.trim();
    if host.is_empty() {
        return Err(AppError::config_error("API host cannot be empty"));
    }

    if host.contains("://") {
        return Err(AppError::config_error(format!(
            "API host must not include a scheme: '{host}'"
        )));
    }

    if host.contains('/') {
        return Err(AppError::config_error(format!(
            "API host must not include a path: '{host}'"
        )));
    }

    if config.max_concurrent_seasons == 0 {
        return Err(AppError::config_error(
            "max_concurrent_seasons must be at least 1",
        ));
    }

    if config.http_timeout_seconds == 0 {
        return Err(AppError::config_error(
            "http_timeout_seconds must be at least 1",
        ));
    }

    if config.max_retries > MAX_RETRIES_LIMIT {
        return Err(AppError::config_error(format!(
            "max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
            config.max_retries
        )));
    }

    for (name, seconds) in [
        ("retry_base_delay_seconds", config.retry_base_delay_seconds),
        ("rate_limit_cooldown_seconds", config.rate_limit_cooldown_seconds),
    ] {
        if seconds > MAX_DELAY_SECONDS {
            return Err(AppError::config_error(format!(
                "{name} must be at most {MAX_DELAY_SECONDS}, got {seconds}"
            )));
        }
    }

    if let Some(log_path) = &config.log_file_path
        && log_path.is_empty()
    {
        return Err(AppError::config_error("Log file path cannot be empty"));
    }

    Ok(())
}
