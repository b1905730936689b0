//! Per-host robots.txt cache
//!
//! Rules are fetched lazily on the first URL seen for a host and kept for the
//! lifetime of the gate. In watch mode the gate outlives individual passes, so
//! rules are not refetched between them.

use crate::robots::ParsedRobots;
use crate::url::host_key;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Answers allow/deny for URLs against each host's robots.txt
///
/// A single lock guards the whole cache and is held while a missing entry is
/// fetched, so concurrent first queries never fetch the same robots.txt twice.
pub struct RobotsGate {
    client: Client,
    user_agent: String,
    cache: Mutex<HashMap<String, ParsedRobots>>,
}

impl RobotsGate {
    /// Creates a gate that fetches robots.txt with the given client
    ///
    /// The client should carry the run's identity headers and a short timeout;
    /// see [`crate::crawler::build_robots_client`].
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether `url` may be fetched
    ///
    /// URLs without a host are let through; they fail later in the fetch path.
    pub async fn allowed(&self, url: &Url) -> bool {
        let Some(host) = host_key(url) else {
            return true;
        };

        let mut cache = self.cache.lock().await;
        if !cache.contains_key(&host) {
            let rules = self.fetch_rules(url).await;
            cache.insert(host.clone(), rules);
        }

        cache
            .get(&host)
            .map(|rules| rules.is_allowed(url.as_str(), &self.user_agent))
            .unwrap_or(true)
    }

    /// Number of hosts with cached rules
    pub async fn cached_hosts(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Fetches `{scheme}://{host}/robots.txt`, failing open
    async fn fetch_rules(&self, url: &Url) -> ParsedRobots {
        let robots_url = match url.join("/robots.txt") {
            Ok(u) => u,
            Err(_) => return ParsedRobots::allow_all(),
        };

        tracing::debug!("Fetching robots.txt: {}", robots_url);

        let response = match self.client.get(robots_url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("robots.txt unavailable at {}: {}", robots_url, e);
                return ParsedRobots::allow_all();
            }
        };

        if response.status() != StatusCode::OK {
            tracing::debug!(
                "robots.txt at {} returned {}, treating as unrestricted",
                robots_url,
                response.status()
            );
            return ParsedRobots::allow_all();
        }

        match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::debug!("Failed to read robots.txt body at {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    }
}
