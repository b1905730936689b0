use crate::common::{create_test_config, mount_page};
use sumi_scrape::crawler::{Coordinator, Downloader, SitemapResolver};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{loc}</loc></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
    )
}

fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<sitemap><loc>{loc}</loc></sitemap>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</sitemapindex>"#
    )
}

async fn mount_xml(server: &MockServer, xml_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(xml_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

/// Index -> two nested sitemaps -> three pages each
async fn mount_sitemap_tree(server: &MockServer) {
    let base_url = server.uri();
    mount_xml(
        server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{base_url}/sitemap-posts.xml"),
            "/sitemap-pages.xml".to_string(),
        ]),
    )
    .await;
    mount_xml(
        server,
        "/sitemap-posts.xml",
        urlset(&[
            format!("{base_url}/posts/1"),
            format!("{base_url}/posts/2"),
            format!("{base_url}/posts/3"),
        ]),
    )
    .await;
    mount_xml(
        server,
        "/sitemap-pages.xml",
        urlset(&[
            "/pages/1".to_string(),
            "/pages/2".to_string(),
            "/pages/3".to_string(),
        ]),
    )
    .await;
}

#[tokio::test]
async fn test_sitemap_index_expands_to_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_sitemap_tree(&mock_server).await;

    let config = create_test_config(vec![]);
    let downloader = Downloader::open(&config, "TestBot/1.0", None).await.unwrap();
    let urls = SitemapResolver::new(&downloader)
        .resolve(&format!("{base_url}/sitemap.xml"))
        .await;

    assert_eq!(urls.len(), 6);
    assert!(urls.iter().all(|u| !u.ends_with(".xml")));
    assert!(urls.contains(&format!("{base_url}/posts/2")));
    assert!(urls.contains(&format!("{base_url}/pages/3")));
}

#[tokio::test]
async fn test_sitemap_limit_caps_urls() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let pages: Vec<String> = (0..10).map(|i| format!("{base_url}/p/{i}")).collect();
    mount_xml(&mock_server, "/sitemap.xml", urlset(&pages)).await;

    let config = create_test_config(vec![]);
    let downloader = Downloader::open(&config, "TestBot/1.0", None).await.unwrap();
    let urls = SitemapResolver::new(&downloader)
        .with_limit(4)
        .resolve(&format!("{base_url}/sitemap.xml"))
        .await;

    assert_eq!(urls, pages[..4].to_vec());
}

#[tokio::test]
async fn test_missing_sitemap_yields_no_urls() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let config = create_test_config(vec![]);
    let downloader = Downloader::open(&config, "TestBot/1.0", None).await.unwrap();
    let urls = SitemapResolver::new(&downloader)
        .resolve(&format!("{base_url}/sitemap.xml"))
        .await;

    assert!(urls.is_empty());
}

#[tokio::test]
async fn test_sitemap_targets_follow_explicit_urls() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_sitemap_tree(&mock_server).await;
    for i in 1..=3 {
        mount_page(&mock_server, &format!("/posts/{i}"), &format!("Post {i}")).await;
        mount_page(&mock_server, &format!("/pages/{i}"), &format!("Page {i}")).await;
    }

    let mut config = create_test_config(vec![
        format!("{base_url}/pages/2"),
        format!("{base_url}/extra"),
    ]);
    config.sitemap = Some(format!("{base_url}/sitemap.xml"));
    config.network.robots = false;

    let coordinator = Coordinator::new(config).unwrap();
    let downloader = Downloader::open(coordinator.config(), coordinator.user_agent(), None)
        .await
        .unwrap();

    let targets = coordinator.collect_targets(&downloader).await;
    assert_eq!(targets.len(), 7);
    assert_eq!(targets[0], format!("{base_url}/pages/2"));
    assert_eq!(targets[1], format!("{base_url}/extra"));

    let records = coordinator.scrape_with(&downloader).await;
    assert_eq!(records.len(), 7);
    assert_eq!(records.iter().filter(|r| r.is_error()).count(), 1);
}
