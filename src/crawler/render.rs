//! Browser-rendered fetch strategy
//!
//! Only compiled with the `render` feature. One headless Chromium is launched
//! per pass; each fetch opens its own page, lets the page's JavaScript run,
//! reads back the rendered DOM and closes the page again.

use crate::config::RenderConfig;
use crate::crawler::fetcher::{FetchFailure, FetchResult, FetchStrategy};
use crate::ScrapeError;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// How often the `wait_for` selector is polled
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fetches pages through a shared headless browser
pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    user_agent: String,
    timeout: Duration,
    wait_for: Option<String>,
}

impl BrowserFetcher {
    /// Launches a headless browser for this pass
    ///
    /// # Arguments
    ///
    /// * `config` - Render timeout and optional selector to wait for
    /// * `proxy` - Proxy server handed to the browser, if any
    /// * `user_agent` - User-Agent every page identifies with
    pub async fn launch(
        config: &RenderConfig,
        proxy: Option<&str>,
        user_agent: &str,
    ) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(config.timeout())
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if let Some(proxy) = proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        let browser_config = builder.build().map_err(ScrapeError::Browser)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        // The handler stream must be driven for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!("Launched headless browser for rendered fetching");

        Ok(Self {
            browser,
            handler,
            user_agent: user_agent.to_string(),
            timeout: config.timeout(),
            wait_for: config.wait_for.clone(),
        })
    }

    async fn render(&self, url: &Url) -> Result<String, String> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| e.to_string())?;

        let result = self.render_on(&page, url).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        result
    }

    async fn render_on(&self, page: &Page, url: &Url) -> Result<String, String> {
        page.set_user_agent(self.user_agent.as_str())
            .await
            .map_err(|e| e.to_string())?;

        tokio::time::timeout(self.timeout, page.goto(url.as_str()))
            .await
            .map_err(|_| format!("navigation timed out after {:?}", self.timeout))?
            .map_err(|e| e.to_string())?;

        if let Some(selector) = &self.wait_for {
            self.wait_for_selector(page, selector, url).await;
        }

        page.content().await.map_err(|e| e.to_string())
    }

    /// Waits for `selector` to appear; giving up is not an error
    async fn wait_for_selector(&self, page: &Page, selector: &str, url: &Url) {
        let appeared = async {
            while page.find_element(selector).await.is_err() {
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        if tokio::time::timeout(self.timeout, appeared).await.is_err() {
            tracing::debug!(
                "Selector '{}' not found on {} within {:?}, reading page as is",
                selector,
                url,
                self.timeout
            );
        }
    }
}

#[async_trait]
impl FetchStrategy for BrowserFetcher {
    async fn fetch_once(&self, url: &Url) -> FetchResult {
        match self.render(url).await {
            // Status is not exposed after in-browser redirects; a loaded page counts as 200
            Ok(html) => FetchResult::Page { html, status: 200 },
            Err(e) => FetchResult::Failed(FetchFailure::RenderException(e)),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
    }
}
