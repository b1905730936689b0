use url::Url;

/// Derives the host key for a URL
///
/// The key is the lowercase host followed by the port when the URL names one
/// explicitly, so `http://127.0.0.1:8080` and `http://127.0.0.1:9090` are
/// tracked as distinct hosts. Robots rules and per-host limits are keyed by it.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scrape::url::host_key;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:3000/").unwrap();
/// assert_eq!(host_key(&url), Some("localhost:3000".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
