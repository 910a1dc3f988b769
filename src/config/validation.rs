use crate::config::types::{BrowserConfig, Config, EngineConfig, HttpConfig, OutputConfig, ProxyConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_engine_config(&config.engine)?;
    validate_http_config(&config.http)?;
    validate_proxy_config(&config.proxy)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates orchestration settings
fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 10_000 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 10000, got {}",
            config.batch_size
        )));
    }

    if config.connectivity_check && config.connectivity_urls.is_empty() {
        return Err(ConfigError::Validation(
            "connectivity_urls cannot be empty when connectivity_check is enabled".to_string(),
        ));
    }

    for probe in &config.connectivity_urls {
        validate_http_url(probe, "connectivity URL")?;
    }

    Ok(())
}

/// Validates direct HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates proxy testing settings
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.test_url, "proxy test_url")?;

    if config.failure_threshold < 1 {
        return Err(ConfigError::Validation(
            "failure_threshold must be >= 1".to_string(),
        ));
    }

    if config.test_concurrency < 1 {
        return Err(ConfigError::Validation(
            "test_concurrency must be >= 1".to_string(),
        ));
    }

    if config.test_timeout_secs < 1 || config.maintenance_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "proxy test timeouts must be >= 1s".to_string(),
        ));
    }

    Ok(())
}

/// Validates browser fallback settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "browser timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.recycle_after < 1 {
        return Err(ConfigError::Validation(
            "browser recycle_after must be >= 1".to_string(),
        ));
    }

    if config.blocked_patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "browser blocked_patterns cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_http_url(candidate: &str, label: &str) -> Result<(), ConfigError> {
    let url = Url::parse(candidate)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", label, candidate, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            label, candidate
        )));
    }

    Ok(())
}
