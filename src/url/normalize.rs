use crate::UrlError;
use std::collections::HashSet;
use url::Url;

/// Normalizes a raw target string into a scrape target
///
/// Targets are kept as strings: the only normalization applied is trimming
/// surrounding whitespace and defaulting the scheme to `http://` when the input
/// does not already carry a scheme with a host. Two targets are the same target
/// exactly when their normalized strings are equal.
///
/// # Examples
///
/// ```
/// use sumi_scrape::url::normalize_target;
///
/// assert_eq!(normalize_target("example.com"), "http://example.com");
/// assert_eq!(normalize_target("https://example.com/a"), "https://example.com/a");
/// ```
pub fn normalize_target(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) if url.has_host() => raw.to_string(),
        _ => format!("http://{}", raw),
    }
}

/// Normalizes and deduplicates targets, keeping the first occurrence of each
///
/// Empty inputs are dropped.
pub fn dedup_targets<I, S>(targets: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for raw in targets {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            continue;
        }
        let target = normalize_target(raw);
        if seen.insert(target.clone()) {
            result.push(target);
        }
    }

    result
}

/// Parses a normalized target into a fetchable URL
///
/// Only `http` and `https` URLs with a host are accepted.
pub fn parse_target(target: &str) -> Result<Url, UrlError> {
    let url = Url::parse(target).map_err(|e| UrlError::Parse(format!("{}: {}", target, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
