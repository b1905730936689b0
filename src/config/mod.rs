//! Configuration module for Sumi-Scrape
//!
//! A [`ScraperConfig`] is assembled once at startup, from an optional TOML file
//! overlaid with command-line flags, validated, and then shared read-only by
//! every component for the rest of the run.
//!
//! # Example
//!
//! ```no_run
//! use sumi_scrape::config::{load_config, validate};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrape.toml")).unwrap();
//! validate(&config).unwrap();
//! println!("Global concurrency: {}", config.network.concurrency);
//! ```

mod parser;
mod selector;
mod types;
mod validation;

// Re-export types
pub use selector::{HeaderPair, SelectorRule};
pub use types::{
    NetworkConfig, OutputConfig, OutputFormat, RenderConfig, ScraperConfig, WatchConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, load_urls_file};
pub use validation::validate;
