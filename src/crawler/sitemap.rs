//! Sitemap discovery
//!
//! Sitemaps are fetched through the [`Downloader`], so they go through the
//! same robots, retry and concurrency policy as pages. Only nodes in the
//! sitemap namespace are considered.

use crate::crawler::Downloader;
use crate::url::{dedup_targets, normalize_target};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use url::Url;

/// Namespace of the sitemaps.org protocol
pub const SITEMAP_NS: &[u8] = b"http://www.sitemaps.org/schemas/sitemap/0.9";

/// Upper bound on URLs taken from one sitemap
pub const MAX_SITEMAP_URLS: usize = 2000;

/// `<loc>` values found in one sitemap document, resolved against its URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapEntries {
    /// Page URLs from `<url><loc>`
    pub pages: Vec<String>,

    /// Nested sitemap URLs from `<sitemap><loc>`
    pub sitemaps: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Url,
    Sitemap,
    Loc,
    Other,
}

/// Parses a sitemap or sitemap index
///
/// A document that is not well-formed XML yields no entries.
pub fn parse_sitemap(content: &str, base: &Url) -> SitemapEntries {
    let mut reader = NsReader::from_str(content);
    reader.trim_text(true);

    let mut entries = SitemapEntries::default();
    let mut stack: Vec<Node> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => {
                let node = if in_sitemap_ns(&ns) {
                    match e.local_name().as_ref() {
                        b"url" => Node::Url,
                        b"sitemap" => Node::Sitemap,
                        b"loc" => Node::Loc,
                        _ => Node::Other,
                    }
                } else {
                    Node::Other
                };
                if node == Node::Loc {
                    text.clear();
                }
                stack.push(node);
            }
            Ok((_, Event::End(_))) => {
                if stack.pop() == Some(Node::Loc) {
                    let loc = text.trim();
                    if !loc.is_empty() {
                        match stack.last() {
                            Some(Node::Url) => entries.pages.extend(resolve_loc(base, loc)),
                            Some(Node::Sitemap) => entries.sitemaps.extend(resolve_loc(base, loc)),
                            _ => {}
                        }
                    }
                    text.clear();
                }
            }
            Ok((_, Event::Text(t))) => {
                if stack.last() == Some(&Node::Loc) {
                    match t.unescape() {
                        Ok(value) => text.push_str(&value),
                        Err(e) => {
                            tracing::warn!("Malformed sitemap text at {}: {}", base, e);
                            return SitemapEntries::default();
                        }
                    }
                }
            }
            Ok((_, Event::CData(c))) => {
                if stack.last() == Some(&Node::Loc) {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Failed to parse sitemap {}: {}", base, e);
                return SitemapEntries::default();
            }
        }
    }

    entries
}

fn in_sitemap_ns(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == SITEMAP_NS)
}

/// Resolves a `<loc>` value relative to the sitemap's own URL
fn resolve_loc(base: &Url, loc: &str) -> Option<String> {
    if Url::parse(loc).is_ok() {
        return Some(loc.to_string());
    }
    match base.join(loc) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!("Skipping sitemap entry {}: {}", loc, e);
            None
        }
    }
}

/// Expands a sitemap URL into page URLs
pub struct SitemapResolver<'a> {
    downloader: &'a Downloader,
    limit: usize,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(downloader: &'a Downloader) -> Self {
        Self {
            downloader,
            limit: MAX_SITEMAP_URLS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Fetches and flattens a sitemap
    ///
    /// If the document lists nested sitemaps, each is fetched in turn and only
    /// their page URLs are kept; nested indexes are not expanded further. A
    /// failed fetch yields no URLs and a warning.
    pub async fn resolve(&self, sitemap_url: &str) -> Vec<String> {
        let target = normalize_target(sitemap_url);
        let Some(entries) = self.fetch_entries(&target).await else {
            return Vec::new();
        };

        let pages = if entries.sitemaps.is_empty() {
            entries.pages
        } else {
            tracing::info!(
                "Sitemap {} lists {} nested sitemaps",
                target,
                entries.sitemaps.len()
            );
            let mut pages = Vec::new();
            for nested in &entries.sitemaps {
                if let Some(nested_entries) = self.fetch_entries(nested).await {
                    pages.extend(nested_entries.pages);
                }
            }
            pages
        };

        let mut urls = dedup_targets(pages);
        if urls.len() > self.limit {
            tracing::warn!(
                "Sitemap {} yielded {} URLs, keeping the first {}",
                target,
                urls.len(),
                self.limit
            );
            urls.truncate(self.limit);
        }

        tracing::info!("Sitemap {} resolved to {} URLs", target, urls.len());
        urls
    }

    async fn fetch_entries(&self, target: &str) -> Option<SitemapEntries> {
        let result = self.downloader.fetch(target).await;
        let Some(content) = result.html() else {
            let reason = result
                .failure()
                .map(|f| f.to_string())
                .unwrap_or_default();
            tracing::warn!("Failed to fetch sitemap {} ({})", target, reason);
            return None;
        };

        let base = match Url::parse(target) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid sitemap URL {}: {}", target, e);
                return None;
            }
        };

        Some(parse_sitemap(content, &base))
    }
}
