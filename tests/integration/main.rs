//! Integration tests for the scraper
//!
//! These tests use wiremock to stand in for target sites, robots.txt and
//! sitemaps, and run whole passes end-to-end.

mod scrape_tests;
mod sitemap_tests;
