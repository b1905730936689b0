//! Politeness-aware downloader
//!
//! Wraps a [`FetchStrategy`] with everything that makes fetching polite and
//! robust:
//! - robots.txt check once per URL, before any attempt
//! - global and per-host concurrency limits
//! - a fixed delay before every attempt
//! - retries with capped, jittered exponential backoff

use crate::config::{NetworkConfig, ScraperConfig};
use crate::crawler::fetcher::{
    build_http_client, FetchFailure, FetchResult, FetchStrategy, HttpFetcher,
};
use crate::crawler::limiter::HostLimiter;
use crate::robots::RobotsGate;
use crate::url::{host_key, parse_target};
use crate::ScrapeError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Fetches URLs through the run's strategy under the run's politeness policy
pub struct Downloader {
    strategy: Box<dyn FetchStrategy>,
    limiter: HostLimiter,
    robots: Option<Arc<RobotsGate>>,
    network: NetworkConfig,
}

impl Downloader {
    /// Creates a downloader around an existing strategy
    ///
    /// # Arguments
    ///
    /// * `strategy` - How single attempts are made
    /// * `network` - Retry, delay and concurrency settings
    /// * `robots` - Robots gate, or `None` when robots.txt is not enforced
    pub fn new(
        strategy: Box<dyn FetchStrategy>,
        network: &NetworkConfig,
        robots: Option<Arc<RobotsGate>>,
    ) -> Self {
        Self {
            strategy,
            limiter: HostLimiter::new(network.concurrency, network.per_host),
            robots,
            network: network.clone(),
        }
    }

    /// Opens a downloader with the strategy the configuration asks for
    ///
    /// In rendered mode this launches the browser; call [`Downloader::close`]
    /// when the pass is over to shut it down.
    pub async fn open(
        config: &ScraperConfig,
        user_agent: &str,
        robots: Option<Arc<RobotsGate>>,
    ) -> Result<Self, ScrapeError> {
        let strategy: Box<dyn FetchStrategy> = if config.render.enabled {
            open_rendered(config, user_agent).await?
        } else {
            let client = build_http_client(&config.network, user_agent)?;
            Box::new(HttpFetcher::new(client, config.network.allow_status.clone()))
        };

        Ok(Self::new(strategy, &config.network, robots))
    }

    /// Fetches a normalized target
    ///
    /// Never fails: every problem is reported as [`FetchResult::Failed`].
    pub async fn fetch(&self, target: &str) -> FetchResult {
        let url = match parse_target(target) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping unparseable target {}: {}", target, e);
                return FetchResult::Failed(FetchFailure::Exception(e.to_string()));
            }
        };

        if let Some(robots) = &self.robots {
            if !robots.allowed(&url).await {
                tracing::info!("Blocked by robots.txt: {}", url);
                return FetchResult::Failed(FetchFailure::Robots);
            }
        }

        let host = host_key(&url).unwrap_or_default();
        let _permit = match self.limiter.acquire(&host).await {
            Ok(permit) => permit,
            Err(e) => return FetchResult::Failed(FetchFailure::Exception(e.to_string())),
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            if let Some(delay) = self.network.delay() {
                tokio::time::sleep(delay).await;
            }

            let failure = match self.strategy.fetch_once(&url).await {
                page @ FetchResult::Page { .. } => return page,
                FetchResult::Failed(failure) => failure,
            };

            if attempt > self.network.retries {
                tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt, failure);
                return FetchResult::Failed(failure);
            }

            tracing::debug!("Attempt {} for {} failed: {}", attempt, url, failure);
            self.sleep_backoff(attempt).await;
        }
    }

    /// Sleeps a random duration in `[0, min(backoff_max, backoff_base * 2^(attempt-1))]`
    async fn sleep_backoff(&self, attempt: u32) {
        let cap = self.network.backoff_cap(attempt);
        if cap <= 0.0 {
            return;
        }
        let secs = rand::rng().random_range(0.0..=cap);
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    /// Number of distinct hosts fetched from so far
    pub fn hosts_seen(&self) -> usize {
        self.limiter.tracked_hosts()
    }

    /// Shuts the strategy down (closes the browser in rendered mode)
    pub async fn close(mut self) {
        self.strategy.close().await;
    }
}

#[cfg(feature = "render")]
async fn open_rendered(
    config: &ScraperConfig,
    user_agent: &str,
) -> Result<Box<dyn FetchStrategy>, ScrapeError> {
    let fetcher = crate::crawler::render::BrowserFetcher::launch(
        &config.render,
        config.network.proxy.as_deref(),
        user_agent,
    )
    .await?;
    Ok(Box::new(fetcher))
}

#[cfg(not(feature = "render"))]
async fn open_rendered(
    _config: &ScraperConfig,
    _user_agent: &str,
) -> Result<Box<dyn FetchStrategy>, ScrapeError> {
    Err(crate::ConfigError::RenderUnavailable.into())
}
