//! URL handling module for Sumi-Scrape
//!
//! This module turns raw target strings into normalized scrape targets,
//! deduplicates them and derives the host keys used by the robots cache and
//! the per-host limiter.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::host_key;
pub use normalize::{dedup_targets, normalize_target, parse_target};
