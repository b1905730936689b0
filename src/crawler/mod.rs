//! Crawler module for fetching and processing pages
//!
//! This module contains the core scraping logic, including:
//! - Fetch strategies (plain HTTP, and headless browser with `render`)
//! - Per-host and global concurrency limits
//! - Retry with backoff, robots.txt gating
//! - Sitemap expansion and field extraction
//! - Pass and watch-loop coordination

mod coordinator;
mod downloader;
mod extractor;
mod fetcher;
mod limiter;
#[cfg(feature = "render")]
mod render;
mod sitemap;

pub use coordinator::{Coordinator, RunOutcome};
pub use downloader::Downloader;
pub use extractor::{Extractor, VALUE_SEPARATOR};
pub use fetcher::{
    build_http_client, build_robots_client, resolve_user_agent, FetchFailure, FetchResult,
    FetchStrategy, HttpFetcher, USER_AGENTS,
};
pub use limiter::{HostLimiter, HostPermit};
#[cfg(feature = "render")]
pub use render::BrowserFetcher;
pub use sitemap::{parse_sitemap, SitemapEntries, SitemapResolver, MAX_SITEMAP_URLS, SITEMAP_NS};
