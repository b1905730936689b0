use crate::config::selector::HeaderPair;
use crate::config::types::{NetworkConfig, RenderConfig, ScraperConfig};
use crate::crawler::Extractor;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::HashSet;
use std::time::Duration;

/// Record keys the scraper writes itself; selector fields may not reuse them
const RESERVED_FIELDS: &[&str] = &["url", "timestamp", "error"];

/// Validates the entire configuration
///
/// Runs before any network activity, so a bad configuration never produces a
/// partial output file.
pub fn validate(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_selectors(config)?;
    validate_sources(config)?;
    validate_network_config(&config.network)?;
    validate_render_config(&config.render)?;

    if config.output.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the extraction rules and compiles their CSS eagerly
fn validate_selectors(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.select.is_empty() {
        return Err(ConfigError::MissingSelectors);
    }

    let mut names = HashSet::new();
    for rule in &config.select {
        if RESERVED_FIELDS.contains(&rule.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "field name '{}' is reserved",
                rule.name
            )));
        }
        if !names.insert(rule.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "field name '{}' is defined more than once",
                rule.name
            )));
        }
    }

    Extractor::new(&config.select)?;
    Ok(())
}

/// Validates that at least one URL source is configured
fn validate_sources(config: &ScraperConfig) -> Result<(), ConfigError> {
    let has_urls = config.urls.iter().any(|u| !u.trim().is_empty());
    let has_sitemap = config
        .sitemap
        .as_deref()
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);

    if !has_urls && !has_sitemap {
        return Err(ConfigError::MissingSource);
    }

    Ok(())
}

/// Validates networking configuration
fn validate_network_config(config: &NetworkConfig) -> Result<(), ConfigError> {
    if config.timeout <= 0.0 || !fits_duration(config.timeout) {
        return Err(ConfigError::Validation(format!(
            "timeout must be a positive number of seconds, got {}",
            config.timeout
        )));
    }

    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    if config.per_host < 1 {
        return Err(ConfigError::Validation(format!(
            "per-host must be >= 1, got {}",
            config.per_host
        )));
    }

    if !fits_duration(config.delay) {
        return Err(ConfigError::Validation(format!(
            "delay must be >= 0 and within range, got {}",
            config.delay
        )));
    }

    if !fits_duration(config.backoff_base) || !fits_duration(config.backoff_max) {
        return Err(ConfigError::Validation(format!(
            "backoff values must be finite and >= 0, got base {} and max {}",
            config.backoff_base, config.backoff_max
        )));
    }

    if config.allow_status.is_empty() {
        return Err(ConfigError::Validation(
            "allow-status must list at least one status".to_string(),
        ));
    }

    for status in &config.allow_status {
        if !(100..=999).contains(status) {
            return Err(ConfigError::Validation(format!(
                "allow-status contains invalid HTTP status {}",
                status
            )));
        }
    }

    for header in &config.headers {
        validate_header(header)?;
    }

    if let Some(proxy) = &config.proxy {
        reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Whether `secs` converts to a `Duration` (non-negative, finite, in range)
fn fits_duration(secs: f64) -> bool {
    Duration::try_from_secs_f64(secs).is_ok()
}

fn validate_header(header: &HeaderPair) -> Result<(), ConfigError> {
    let display = format!("{}: {}", header.name, header.value);
    HeaderName::from_bytes(header.name.as_bytes())
        .map_err(|_| ConfigError::InvalidHeader(display.clone()))?;
    HeaderValue::from_str(&header.value).map_err(|_| ConfigError::InvalidHeader(display))?;
    Ok(())
}

/// Validates rendered mode configuration
fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if !cfg!(feature = "render") {
        return Err(ConfigError::RenderUnavailable);
    }

    if config.timeout <= 0.0 || !fits_duration(config.timeout) {
        return Err(ConfigError::Validation(format!(
            "render-timeout must be a positive number of seconds, got {}",
            config.timeout
        )));
    }

    if let Some(wait_for) = &config.wait_for {
        scraper::Selector::parse(wait_for).map_err(|e| ConfigError::InvalidCss {
            name: "--wait-for".to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}
