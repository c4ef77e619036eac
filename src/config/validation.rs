use crate::catalog::CatalogUrl;
use crate::config::types::{BrowserConfig, CatalogConfig, Config, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates catalog configuration
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    // Page 1 is bootstrapped alone, so the queue needs at least page 2 below the ceiling
    if config.upper_bound < 2 {
        return Err(ConfigError::Validation(format!(
            "upper_bound must be >= 2, got {}",
            config.upper_bound
        )));
    }

    CatalogUrl::new(&config.url_template, config.page_size)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url_template: {}", e)))?;

    Ok(())
}

/// Validates browser and worker pool configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.navigation_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_ms must be >= 1000ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.extraction_script.trim().is_empty() {
        return Err(ConfigError::Validation(
            "extraction_script cannot be empty".to_string(),
        ));
    }

    if config.identifier_field.is_empty() {
        return Err(ConfigError::Validation(
            "identifier_field cannot be empty".to_string(),
        ));
    }

    let endpoint = Url::parse(&config.debug_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid debug_endpoint: {}", e)))?;

    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "debug_endpoint must use http or https, got '{}'",
            config.debug_endpoint
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.snapshot_path.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot_path cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
