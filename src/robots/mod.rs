//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. The cache fails open: a robots.txt that cannot be fetched
//! places no restrictions on the host.

mod cache;
mod parser;

pub use cache::RobotsGate;
pub use parser::{product_token, ParsedRobots};
