use crate::config::types::{Config, FetchConfig, HarvestConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the detail-page concurrency setting
pub const MAX_CONCURRENT_LIMIT: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates index walk and fan-out settings
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    validate_http_url("site_url", &config.site_url)?;
    validate_http_url("index_url", &config.index_url)?;

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start_page must be >= 1, got {}",
            config.start_page
        )));
    }

    if config.end_page < config.start_page {
        return Err(ConfigError::Validation(format!(
            "end_page ({}) must not be before start_page ({})",
            config.end_page, config.start_page
        )));
    }

    if config.max_concurrent < 1 || config.max_concurrent > MAX_CONCURRENT_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and {}, got {}",
            MAX_CONCURRENT_LIMIT, config.max_concurrent
        )));
    }

    if config.max_listings_per_page == Some(0) {
        return Err(ConfigError::Validation(
            "max_listings_per_page must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP fetch settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeouts must be at least 1 second".to_string(),
        ));
    }

    if config.connect_timeout_secs >= config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs ({}) must be shorter than timeout_secs ({})",
            config.connect_timeout_secs, config.timeout_secs
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a configured URL parses and uses http or https
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("{} '{}': {}", name, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https, got '{}'",
            name, value, other
        ))),
    }
}
