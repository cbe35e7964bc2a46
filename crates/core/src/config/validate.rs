use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - query is non-empty
/// - worker count, attempt budget and request timeout are non-zero
/// - base URL is present
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.scrape.query.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "scrape.query must not be empty".to_string(),
        ));
    }

    if config.scrape.workers == 0 {
        return Err(ConfigError::ValidationError(
            "scrape.workers must be at least 1".to_string(),
        ));
    }

    if config.http.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "http.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.http.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "http.base_url must not be empty".to_string(),
        ));
    }

    Ok(())
}
