//! Fetch strategies
//!
//! A [`FetchStrategy`] performs exactly one attempt at retrieving a page. The
//! retry loop, politeness delays, robots.txt checks and concurrency limits
//! live in [`crate::crawler::Downloader`], so every strategy gets them for free.
//!
//! This module also builds the HTTP clients used for page fetches and for
//! robots.txt lookups.

use crate::config::NetworkConfig;
use crate::{ConfigError, ScrapeError};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Browser User-Agents used when none is configured
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125 Safari/537.36",
];

/// Timeout for robots.txt lookups
const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a URL produced no content
///
/// The `Display` form is the classification written to the `error` field of
/// the output record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Disallowed by robots.txt; never retried
    Robots,

    /// Response status outside the allowed set
    BadStatus(u16),

    /// Connection, timeout, DNS, TLS or body read failure
    Exception(String),

    /// Browser navigation or page lifecycle failure
    RenderException(String),
}

impl FetchFailure {
    /// Short classification without the detail, e.g. `bad_status`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Robots => "robots",
            Self::BadStatus(_) => "bad_status",
            Self::Exception(_) => "exception",
            Self::RenderException(_) => "render_exception",
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Robots => write!(f, "robots"),
            Self::BadStatus(code) => write!(f, "bad_status:{}", code),
            Self::Exception(detail) => write!(f, "exception:{}", detail),
            Self::RenderException(detail) => write!(f, "render_exception:{}", detail),
        }
    }
}

/// Outcome of fetching one URL
///
/// Either the page content or the reason there is none; never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Page retrieved with an accepted status
    Page {
        /// Raw (or browser-rendered) HTML
        html: String,
        /// HTTP status code
        status: u16,
    },

    /// No content; a normal, expected outcome
    Failed(FetchFailure),
}

impl FetchResult {
    pub fn html(&self) -> Option<&str> {
        match self {
            Self::Page { html, .. } => Some(html),
            Self::Failed(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Page { status, .. } => Some(*status),
            Self::Failed(FetchFailure::BadStatus(code)) => Some(*code),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Page { .. } => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page { .. })
    }
}

/// A way of retrieving page content, selected once per run
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Makes a single attempt at fetching `url`
    async fn fetch_once(&self, url: &Url) -> FetchResult;

    /// Releases any resources held by the strategy
    async fn close(&mut self) {}
}

/// Plain HTTP GET strategy
pub struct HttpFetcher {
    client: Client,
    allow_status: Vec<u16>,
}

impl HttpFetcher {
    pub fn new(client: Client, allow_status: Vec<u16>) -> Self {
        Self {
            client,
            allow_status,
        }
    }
}

#[async_trait]
impl FetchStrategy for HttpFetcher {
    async fn fetch_once(&self, url: &Url) -> FetchResult {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return FetchResult::Failed(FetchFailure::Exception(describe_error(&e))),
        };

        let status = response.status().as_u16();
        if !self.allow_status.contains(&status) {
            return FetchResult::Failed(FetchFailure::BadStatus(status));
        }

        match response.text().await {
            Ok(html) => FetchResult::Page { html, status },
            Err(e) => FetchResult::Failed(FetchFailure::Exception(describe_error(&e))),
        }
    }
}

/// Renders a reqwest error with its kind so timeouts are recognizable in output
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("Timeout({})", error)
    } else if error.is_connect() {
        format!("ConnectError({})", error)
    } else {
        error.to_string()
    }
}

/// Picks the User-Agent for the run
///
/// An explicit `user-agent` wins, then a `User-Agent` passed as an extra
/// header, then a random browser UA.
pub fn resolve_user_agent(config: &NetworkConfig) -> String {
    if let Some(ua) = config.user_agent.as_deref().filter(|ua| !ua.trim().is_empty()) {
        return ua.to_string();
    }

    if let Some(header) = config
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("user-agent"))
    {
        return header.value.clone();
    }

    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
        .to_string()
}

/// Builds the identity headers sent with every request
fn build_headers(config: &NetworkConfig, user_agent: &str) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();

    let ua = HeaderValue::from_str(user_agent)
        .map_err(|_| ConfigError::InvalidHeader(format!("User-Agent: {}", user_agent)))?;
    headers.insert(USER_AGENT, ua);

    for header in &config.headers {
        let invalid = || ConfigError::InvalidHeader(format!("{}: {}", header.name, header.value));
        let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(&header.value).map_err(|_| invalid())?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Builds the HTTP client used for page and sitemap fetches
///
/// Redirects are followed, the configured proxy and headers are applied and
/// every request is bounded by the configured timeout.
///
/// # Example
///
/// ```no_run
/// use sumi_scrape::config::NetworkConfig;
/// use sumi_scrape::crawler::build_http_client;
///
/// let client = build_http_client(&NetworkConfig::default(), "ResearchBot/1.0").unwrap();
/// ```
pub fn build_http_client(config: &NetworkConfig, user_agent: &str) -> Result<Client, ScrapeError> {
    let mut builder = Client::builder()
        .default_headers(build_headers(config, user_agent)?)
        .timeout(config.timeout())
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Builds the client used for robots.txt lookups
///
/// Same identity as page fetches, but never proxied and with a short timeout.
pub fn build_robots_client(config: &NetworkConfig, user_agent: &str) -> Result<Client, ScrapeError> {
    Ok(Client::builder()
        .default_headers(build_headers(config, user_agent)?)
        .timeout(ROBOTS_TIMEOUT)
        .no_proxy()
        .gzip(true)
        .brotli(true)
        .build()?)
}
