//! Browser debug endpoint discovery against mock servers

use sku_harvester::config::{
    BrowserConfig, CatalogConfig, Config, OutputConfig, DEFAULT_EXTRACTION_SCRIPT,
    DEFAULT_IDENTIFIER_FIELD,
};
use sku_harvester::harvester::run_harvest;
use sku_harvester::render::discover_websocket_url;
use sku_harvester::HarvestError;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_discovers_websocket_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Browser": "Chrome/120.0.6099.109",
            "Protocol-Version": "1.3",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc-123"
        })))
        .mount(&mock_server)
        .await;

    let endpoint = format!("{}/json/version", mock_server.uri());
    let ws_url = discover_websocket_url(&endpoint)
        .await
        .expect("Discovery failed");

    assert_eq!(ws_url, "ws://127.0.0.1:9222/devtools/browser/abc-123");
}

#[tokio::test]
async fn test_missing_websocket_url_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Browser": "Chrome/120.0.6099.109"
        })))
        .mount(&mock_server)
        .await;

    let endpoint = format!("{}/json/version", mock_server.uri());
    let result = discover_websocket_url(&endpoint).await;

    assert!(matches!(result, Err(HarvestError::Discovery { .. })));
}

#[tokio::test]
async fn test_error_status_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let endpoint = format!("{}/json/version", mock_server.uri());
    match discover_websocket_url(&endpoint).await {
        Err(HarvestError::Discovery { message, .. }) => assert!(message.contains("500")),
        other => panic!("Expected discovery error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_aborts_harvest() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let db_path = dir.path().join("harvest.db");
    let config = Config {
        catalog: CatalogConfig {
            url_template: "https://shop.example.com/list?p={page}".to_string(),
            page_size: 36,
            upper_bound: 10,
        },
        browser: BrowserConfig {
            debug_endpoint: format!("{}/json/version", mock_server.uri()),
            workers: 2,
            navigation_timeout_ms: 1000,
            settle_delay_ms: 0,
            bootstrap_settle_ms: 0,
            extraction_script: DEFAULT_EXTRACTION_SCRIPT.to_string(),
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
        },
        output: OutputConfig {
            snapshot_path: dir.path().join("skus.csv").display().to_string(),
            database_path: db_path.display().to_string(),
            summary_path: None,
        },
    };

    let result = run_harvest(config, "hash").await;

    assert!(matches!(result, Err(HarvestError::Discovery { .. })));
    // Nothing was recorded or written
    assert!(!db_path.exists());
    assert!(!dir.path().join("skus.csv").exists());
}
