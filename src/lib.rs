//! Sumi-Scrape: a polite real-time web scraper
//!
//! This crate fetches pages over plain HTTP or through a headless browser,
//! respects robots.txt and per-host concurrency limits, extracts fields with
//! CSS selectors and writes the results as CSV or JSON-Lines. In watch mode the
//! whole pass is repeated on an interval, each pass landing in its own
//! timestamped file.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Scrape operations
///
/// Failures of individual URLs never surface here; they are folded into
/// error records (see [`crawler::FetchFailure`]).
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// All of these are raised before any network activity starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("You must provide at least one --select name=CSS_SELECTOR")]
    MissingSelectors,

    #[error("Provide --urls / --urls-file or --sitemap")]
    MissingSource,

    #[error("Invalid selector mapping '{0}', expected name=CSS_SELECTOR")]
    InvalidSelectorRule(String),

    #[error("Invalid CSS selector for field '{name}': {message}")]
    InvalidCss { name: String, message: String },

    #[error("Invalid header '{0}', expected 'Name: Value'")]
    InvalidHeader(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("URL file not found: {0}")]
    UrlsFileMissing(String),

    #[error("Rendered mode requested but this build has no browser support (rebuild with --features render)")]
    RenderUnavailable,
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sumi-Scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

// Re-export commonly used types
pub use config::ScraperConfig;
pub use crawler::{Coordinator, FetchFailure, FetchResult};
pub use output::Record;
pub use url::{dedup_targets, host_key, normalize_target};
