//! Scrape coordinator - pass and watch-loop orchestration
//!
//! This module drives a run:
//! - Assembling the target list (explicit URLs, then sitemap discoveries)
//! - Fetching and extracting every target concurrently
//! - Writing each pass's batch of records
//! - Repeating passes on an interval in watch mode until shut down

use crate::config::{validate, ScraperConfig};
use crate::crawler::fetcher::{build_robots_client, resolve_user_agent, FetchResult};
use crate::crawler::{Downloader, Extractor, SitemapResolver};
use crate::output::{timestamped_path, write_records, PassStatistics, Record};
use crate::robots::RobotsGate;
use crate::url::dedup_targets;
use crate::ScrapeError;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// How often (in completed URLs) progress is logged
const PROGRESS_INTERVAL: usize = 10;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every requested pass finished
    Completed { passes: u64 },

    /// A shutdown signal arrived; the pass in flight was dropped unwritten
    Interrupted { passes: u64 },
}

impl RunOutcome {
    /// Number of passes whose output was written
    pub fn passes(&self) -> u64 {
        match self {
            Self::Completed { passes } | Self::Interrupted { passes } => *passes,
        }
    }
}

/// Main scrape coordinator structure
pub struct Coordinator {
    config: ScraperConfig,
    extractor: Extractor,
    user_agent: String,
    robots: Option<Arc<RobotsGate>>,
}

impl Coordinator {
    /// Creates a coordinator from a configuration
    ///
    /// The configuration is validated here, so a bad selector or a missing URL
    /// source fails before any network activity.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScrapeError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        validate(&config)?;

        let extractor = Extractor::new(&config.select)?;
        let user_agent = resolve_user_agent(&config.network);
        tracing::debug!("Using User-Agent: {}", user_agent);

        let robots = if config.network.robots {
            let client = build_robots_client(&config.network, &user_agent)?;
            Some(Arc::new(RobotsGate::new(client, user_agent.clone())))
        } else {
            tracing::info!("robots.txt checks disabled");
            None
        };

        Ok(Self {
            config,
            extractor,
            user_agent,
            robots,
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The robots gate shared by every pass, if robots.txt is enforced
    pub fn robots_gate(&self) -> Option<Arc<RobotsGate>> {
        self.robots.clone()
    }

    /// Builds the deduplicated target list for one pass
    ///
    /// Explicit URLs come first, in the order given; sitemap discoveries not
    /// already present follow.
    pub async fn collect_targets(&self, downloader: &Downloader) -> Vec<String> {
        let explicit = self.config.urls.iter().cloned();

        match &self.config.sitemap {
            Some(sitemap) => {
                let discovered = SitemapResolver::new(downloader).resolve(sitemap).await;
                dedup_targets(explicit.chain(discovered))
            }
            None => dedup_targets(explicit),
        }
    }

    /// Runs one pass through an already opened downloader
    ///
    /// Returns one record per target, in completion order.
    pub async fn scrape_with(&self, downloader: &Downloader) -> Vec<Record> {
        let targets = self.collect_targets(downloader).await;
        let total = targets.len();
        tracing::info!("Scraping {} URLs", total);

        let started = Instant::now();
        let mut pending: FuturesUnordered<_> = targets
            .iter()
            .map(|target| self.scrape_target(downloader, target))
            .collect();

        let mut records = Vec::with_capacity(total);
        while let Some(record) = pending.next().await {
            records.push(record);

            if records.len() % PROGRESS_INTERVAL == 0 {
                let rate = records.len() as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} URLs, {:.2} URLs/sec",
                    records.len(),
                    total,
                    rate
                );
            }
        }

        records
    }

    async fn scrape_target(&self, downloader: &Downloader, target: &str) -> Record {
        let include_timestamp = self.config.watch.timestamp;
        match downloader.fetch(target).await {
            FetchResult::Page { html, .. } => {
                self.extractor.extract(target, &html, include_timestamp)
            }
            FetchResult::Failed(failure) => Record::failed(target, &failure, include_timestamp),
        }
    }

    /// Runs one pass with a freshly opened downloader and closes it afterwards
    pub async fn scrape_once(&self) -> Result<Vec<Record>, ScrapeError> {
        let downloader = Downloader::open(&self.config, &self.user_agent, self.robots_gate()).await?;
        let records = self.scrape_with(&downloader).await;
        downloader.close().await;
        Ok(records)
    }

    /// Single-pass mode: scrape everything and write the configured output file
    pub async fn run_once(&self) -> Result<PathBuf, ScrapeError> {
        let path = self.config.output.path.clone();
        self.run_pass(1, &path).await?;
        Ok(path)
    }

    /// Watch mode pass: output lands in a file stamped with the pass start time
    async fn run_watch_pass(&self, pass: u64) -> Result<PathBuf, ScrapeError> {
        let path = timestamped_path(&self.config.output.path, Utc::now());
        self.run_pass(pass, &path).await?;
        Ok(path)
    }

    async fn run_pass(&self, pass: u64, path: &Path) -> Result<(), ScrapeError> {
        let records = self.scrape_once().await?;
        PassStatistics::from_records(&records).log(pass);

        write_records(path, self.config.output.effective_format(), &records)?;
        tracing::info!("[{}] Wrote {} with {} rows", pass, path.display(), records.len());
        Ok(())
    }

    /// Repeats passes on the watch interval
    ///
    /// Stops after `limit` passes if given, otherwise only when `shutdown`
    /// flips to `true`. A pass whose output cannot be written is logged and
    /// not counted; the loop carries on.
    pub async fn run_passes(
        &self,
        mut shutdown: watch::Receiver<bool>,
        limit: Option<u64>,
    ) -> RunOutcome {
        let interval = self.config.watch.interval();
        let mut iteration: u64 = 0;
        let mut passes: u64 = 0;

        loop {
            iteration += 1;
            tracing::info!("Starting pass {}", iteration);

            tokio::select! {
                result = self.run_watch_pass(iteration) => match result {
                    Ok(_) => passes += 1,
                    Err(e) => tracing::error!("Pass {} failed: {}", iteration, e),
                },
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::info!("Shutdown requested during pass {}", iteration);
                    return RunOutcome::Interrupted { passes };
                }
            }

            if limit.is_some_and(|limit| iteration >= limit) {
                return RunOutcome::Completed { passes };
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::info!("Shutdown requested, stopping after {} passes", passes);
                    return RunOutcome::Interrupted { passes };
                }
            }
        }
    }

    /// Runs in the mode the configuration selects
    ///
    /// Single-pass mode propagates a write failure; watch mode only returns
    /// once shut down.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<RunOutcome, ScrapeError> {
        if self.config.watch.is_enabled() {
            tracing::info!(
                "Watch mode: re-scraping every {} seconds",
                self.config.watch.seconds
            );
            return Ok(self.run_passes(shutdown, None).await);
        }

        tokio::select! {
            result = self.run_once() => result.map(|_| RunOutcome::Completed { passes: 1 }),
            _ = wait_for_shutdown(&mut shutdown) => {
                tracing::info!("Shutdown requested, output not written");
                Ok(RunOutcome::Interrupted { passes: 0 })
            }
        }
    }
}

/// Resolves once the shutdown flag is set
///
/// A dropped sender never resolves: nobody is left to ask for a shutdown.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
