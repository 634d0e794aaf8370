//! CDP browser control implementation
//!
//! Browser-level operations go through the DevTools HTTP endpoints
//! (`/json/new`, `/json/close`); page traffic goes through
//! one WebSocket connection per target.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser endpoint (e.g., "ws://127.0.0.1:9222/devtools/browser/<id>")
    endpoint: String,
    /// HTTP client for the DevTools endpoints
    http: reqwest::Client,
    /// Active connections (target_id -> connection)
    connections: Mutex<HashMap<String, Arc<dyn CdpConnection>>>,
}

/// Reduce a ws/http DevTools URL to its `http(s)://host:port` origin
pub fn http_endpoint(endpoint: &str) -> String {
    let converted = endpoint
        .replacen("ws://", "http://", 1)
        .replacen("wss://", "https://", 1);

    match converted.find("://") {
        Some(scheme_end) => {
            let authority_start = scheme_end + 3;
            match converted[authority_start..].find('/') {
                Some(path_start) => converted[..authority_start + path_start].to_string(),
                None => converted,
            }
        }
        None => format!("http://{}", converted.trim_end_matches('/')),
    }
}

impl CdpBrowserImpl {
    /// Create a new CDP browser controller
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into();
        debug!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            http: reqwest::Client::new(),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Origin the DevTools HTTP endpoints live under
    pub fn http_endpoint(&self) -> String {
        http_endpoint(&self.endpoint)
    }

    async fn get_json(&self, request: reqwest::RequestBuilder, what: &str) -> Result<serde_json::Value, Error> {
        let response = request.send().await.map_err(|e| {
            Error::cdp(format!(
                "Failed to reach DevTools endpoint {} ({}): {}",
                self.http_endpoint(),
                what,
                e
            ))
        })?;

        let text = response
            .text()
            .await
            .map_err(|e| Error::cdp(format!("Failed to read {} response: {}", what, e)))?;

        serde_json::from_str(&text)
            .map_err(|e| Error::cdp(format!("Failed to parse {} response: {} (response was: {})", what, e, text)))
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        info!("Creating CDP client for target: {}", target_url);

        let connection = CdpWebSocketConnection::new(target_url).await?;

        let target_id = target_url
            .rsplit('/')
            .next()
            .unwrap_or("unknown")
            .to_string();
        self.connections
            .lock()
            .await
            .insert(target_id, Arc::clone(&connection) as Arc<dyn CdpConnection>);

        let client = Arc::new(CdpClientImpl::new(connection));

        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        Ok(client)
    }

    async fn close(&self) -> Result<(), Error> {
        let mut connections = self.connections.lock().await;
        if connections.is_empty() {
            return Ok(());
        }

        info!("Closing {} CDP connections to {}", connections.len(), self.endpoint);

        for (target_id, connection) in connections.drain() {
            if let Err(e) = connection.close().await {
                warn!("Failed to close connection to {}: {}", target_id, e);
            }
        }

        Ok(())
    }

    /// Uses the /json/new endpoint, which creates a page and answers with
    /// its WebSocket URL.
    async fn create_target(&self, url: &str) -> Result<String, Error> {
        info!("Creating new target with URL: {}", url);

        let new_url = format!("{}/json/new?{}", self.http_endpoint(), url);
        let target_json = self.get_json(self.http.put(&new_url), "new target").await?;

        let ws_url = target_json
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No webSocketDebuggerUrl in new target response"))?;

        debug!("Created new target with WebSocket URL: {}", ws_url);

        Ok(ws_url.to_string())
    }

    async fn close_target(&self, target_id: &str) -> Result<(), Error> {
        if let Some(connection) = self.connections.lock().await.remove(target_id) {
            if let Err(e) = connection.close().await {
                warn!("Failed to close connection to {}: {}", target_id, e);
            }
        }

        let url = format!("{}/json/close/{}", self.http_endpoint(), target_id);
        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::cdp(format!("Failed to close target {}: {}", target_id, e)))?;

        debug!("Closed target {}", target_id);
        Ok(())
    }
}
