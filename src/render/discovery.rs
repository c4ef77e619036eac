//! Browser debug endpoint discovery
//!
//! Chromium started with `--remote-debugging-port` publishes its DevTools
//! WebSocket address at `/json/version`. The harvester queries it once at
//! startup; failing to reach it aborts the run.

use crate::HarvestError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "Browser", default)]
    browser: Option<String>,

    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
}

/// Queries the debug endpoint and returns the browser's WebSocket URL
///
/// # Arguments
///
/// * `endpoint` - Discovery URL, usually `http://localhost:9222/json/version`
///
/// # Returns
///
/// * `Ok(String)` - The `webSocketDebuggerUrl` advertised by the browser
/// * `Err(HarvestError::Discovery)` - Endpoint unreachable or response malformed
pub async fn discover_websocket_url(endpoint: &str) -> Result<String, HarvestError> {
    let discovery_error = |message: String| HarvestError::Discovery {
        endpoint: endpoint.to_string(),
        message,
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .build()?;

    let response = client
        .get(endpoint)
        .send()
        .await
        .map_err(|e| discovery_error(e.to_string()))?;

    if !response.status().is_success() {
        return Err(discovery_error(format!("HTTP {}", response.status().as_u16())));
    }

    let info: VersionInfo = response
        .json()
        .await
        .map_err(|e| discovery_error(format!("invalid version document: {}", e)))?;

    let ws_url = info
        .web_socket_debugger_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| discovery_error("no webSocketDebuggerUrl advertised".to_string()))?;

    tracing::info!(
        "Found browser {} at {}",
        info.browser.as_deref().unwrap_or("(unknown)"),
        ws_url
    );

    Ok(ws_url)
}
