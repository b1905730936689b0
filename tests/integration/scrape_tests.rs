use crate::common::{create_test_config, mount_page, requests_to};
use std::collections::HashMap;
use std::fs;
use sumi_scrape::config::OutputFormat;
use sumi_scrape::crawler::Coordinator;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_one_record_per_distinct_target() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/a", "A").await;
    mount_page(&mock_server, "/b", "B").await;

    let host = base_url.trim_start_matches("http://").to_string();
    let mut config = create_test_config(vec![
        format!("{base_url}/a"),
        format!("{base_url}/b"),
        format!("{base_url}/a"),
        format!("  {base_url}/b  "),
        // Scheme defaulted to http:// normalizes to the same target
        format!("{host}/a"),
    ]);
    config.network.robots = false;

    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.scrape_once().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(requests_to(&mock_server, "/a").await, 1);
    assert_eq!(requests_to(&mock_server, "/b").await, 1);
}

#[tokio::test]
async fn test_csv_output_round_trip() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/one", "First, \"quoted\"").await;
    mount_page(&mock_server, "/two", "Second").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("nested").join("out.csv");

    let mut config = create_test_config(vec![
        format!("{base_url}/one"),
        format!("{base_url}/two"),
        format!("{base_url}/gone"),
    ]);
    config.output.path = out.clone();
    config.watch.timestamp = false;

    let coordinator = Coordinator::new(config).unwrap();
    let written = coordinator.run_once().await.unwrap();
    assert_eq!(written, out);

    let mut reader = csv::Reader::from_path(&out).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["error", "heading", "title", "url"]);

    let rows: HashMap<String, HashMap<String, String>> = reader
        .records()
        .map(|row| {
            let row = row.unwrap();
            let fields: HashMap<String, String> = headers
                .iter()
                .cloned()
                .zip(row.iter().map(String::from))
                .collect();
            (fields["url"].clone(), fields)
        })
        .collect();

    assert_eq!(rows.len(), 3);
    let one = &rows[&format!("{base_url}/one")];
    assert_eq!(one["title"], "First, \"quoted\"");
    assert_eq!(one["heading"], "First, \"quoted\" heading");
    assert_eq!(one["error"], "");

    let gone = &rows[&format!("{base_url}/gone")];
    assert_eq!(gone["error"], "bad_status:404");
    assert_eq!(gone["title"], "");
}

#[tokio::test]
async fn test_jsonl_output_keeps_error_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/ok", "Fine").await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out.data");

    let mut config = create_test_config(vec![
        format!("{base_url}/ok"),
        format!("{base_url}/broken"),
        "http://127.0.0.1:1/unreachable".to_string(),
    ]);
    config.output.path = out.clone();
    config.output.format = OutputFormat::JsonLines;

    let coordinator = Coordinator::new(config).unwrap();
    coordinator.run_once().await.unwrap();

    let content = fs::read_to_string(&out).unwrap();
    let objects: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(objects.len(), 3);

    let by_url = |url: &str| {
        objects
            .iter()
            .find(|o| o["url"] == url)
            .unwrap_or_else(|| panic!("no record for {url}"))
            .clone()
    };

    let ok = by_url(&format!("{base_url}/ok"));
    assert_eq!(ok["title"], "Fine");
    assert!(ok["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(ok.get("error").is_none());

    let broken = by_url(&format!("{base_url}/broken"));
    assert_eq!(broken["error"], "bad_status:500");
    assert!(broken.get("title").is_none());

    let unreachable = by_url("http://127.0.0.1:1/unreachable");
    assert!(unreachable["error"]
        .as_str()
        .unwrap()
        .starts_with("exception:"));
}

#[tokio::test]
async fn test_retry_until_success() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", "Recovered").await;

    let mut config = create_test_config(vec![format!("{base_url}/flaky")]);
    config.network.retries = 3;
    config.network.robots = false;

    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.scrape_once().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("title"), Some("Recovered"));
    assert!(!records[0].is_error());
    assert_eq!(requests_to(&mock_server, "/flaky").await, 3);
}

#[tokio::test]
async fn test_retries_exhausted_reports_last_status() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![format!("{base_url}/down")]);
    config.network.retries = 2;
    config.network.robots = false;

    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.scrape_once().await.unwrap();

    assert_eq!(records[0].error(), Some("bad_status:503"));
    assert_eq!(requests_to(&mock_server, "/down").await, 3);
}

#[tokio::test]
async fn test_allowed_status_is_scraped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/soft-404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string("<title>Not here</title>"),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![format!("{base_url}/soft-404")]);
    config.network.allow_status = vec![200, 404];
    config.network.robots = false;

    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.scrape_once().await.unwrap();
    assert_eq!(records[0].get("title"), Some("Not here"));
}

#[tokio::test]
async fn test_robots_disallow_prevents_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Secret</title>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/public", "Public").await;

    let config = create_test_config(vec![
        format!("{base_url}/private/page"),
        format!("{base_url}/public"),
    ]);

    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.scrape_once().await.unwrap();
    assert_eq!(records.len(), 2);

    let private = records
        .iter()
        .find(|r| r.url().ends_with("/private/page"))
        .unwrap();
    assert_eq!(private.error(), Some("robots"));

    let public = records.iter().find(|r| r.url().ends_with("/public")).unwrap();
    assert_eq!(public.get("title"), Some("Public"));
}

#[tokio::test]
async fn test_robots_agent_specific_group() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /",
        ))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/page", "Page").await;

    let config = create_test_config(vec![format!("{base_url}/page")]);
    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.scrape_once().await.unwrap();

    assert_eq!(records[0].error(), Some("robots"));
    assert_eq!(requests_to(&mock_server, "/page").await, 0);
}

#[tokio::test]
async fn test_no_robots_skips_robots_lookup() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/page", "Page").await;

    let mut config = create_test_config(vec![format!("{base_url}/page")]);
    config.network.robots = false;

    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.scrape_once().await.unwrap();
    assert_eq!(records[0].get("title"), Some("Page"));
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(wiremock::matchers::header("x-api-key", "secret"))
        .and(wiremock::matchers::header("user-agent", crate::common::TEST_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Authorized</title>"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![format!("{base_url}/headers")]);
    config.network.robots = false;
    config.network.headers = vec!["X-Api-Key: secret".parse().unwrap()];

    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.scrape_once().await.unwrap();
    assert_eq!(records[0].get("title"), Some("Authorized"));
}
