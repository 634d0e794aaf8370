//! Mock Chrome DevTools Protocol server
//!
//! Answers the commands `CdpDriver` sends over a page target WebSocket,
//! records every request, and opens a JavaScript dialog after each
//! navigation so dialog dismissal can be observed.

mod common;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use slack_e2e::cdp::CdpBrowserImpl;
use slack_e2e::driver::{BrowserOptions, CdpDriver, Driver, Key, Locator};
use slack_e2e::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};

const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

type Requests = Arc<Mutex<Vec<Value>>>;

/// Mock Chrome server
pub struct MockChromeServer {
    addr: String,
    requests: Requests,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockChromeServer {
    /// Start a new mock Chrome server
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                tokio::spawn(Self::handle_connection(stream, Arc::clone(&recorded)));
                            }
                            Err(e) => {
                                tracing::error!("Mock Chrome: Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Ok(Self {
            addr: format!("ws://{}", addr),
            requests,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// WebSocket URL of the single page target
    pub fn target_url(&self) -> String {
        format!("{}/devtools/page/T1", self.addr)
    }

    /// Methods received so far, in order
    pub fn methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r["method"].as_str().map(str::to_string))
            .collect()
    }

    /// Params of every request for `method`
    pub fn params(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r["method"] == method)
            .map(|r| r["params"].clone())
            .collect()
    }

    async fn handle_connection(stream: TcpStream, requests: Requests) {
        // Plain HTTP requests (e.g. /json/close) fail the handshake and are dropped
        let Ok(ws_stream) = accept_async(stream).await else {
            return;
        };
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let mut url = "about:blank".to_string();

        while let Some(Ok(message)) = ws_receiver.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let Ok(req) = serde_json::from_str::<Value>(&text) else {
                continue;
            };
            requests.lock().unwrap().push(req.clone());

            let id = req["id"].as_u64().unwrap_or(0);
            let method = req["method"].as_str().unwrap_or("");
            let result = match method {
                "Page.navigate" => {
                    url = req["params"]["url"].as_str().unwrap_or("").to_string();
                    Ok(json!({ "frameId": "F1", "loaderId": "L1" }))
                }
                "Runtime.evaluate" => Ok(Self::evaluate(
                    req["params"]["expression"].as_str().unwrap_or(""),
                    &url,
                )),
                "Page.captureScreenshot" => Ok(json!({ "data": PNG_BASE64 })),
                "Page.enable"
                | "Runtime.enable"
                | "Page.handleJavaScriptDialog"
                | "Emulation.setDeviceMetricsOverride"
                | "Input.dispatchMouseEvent"
                | "Input.dispatchKeyEvent"
                | "Input.insertText"
                | "Network.clearBrowserCookies"
                | "Network.clearBrowserCache" => Ok(json!({})),
                other => Err(format!("Method not implemented: {}", other)),
            };

            let response = match result {
                Ok(result) => json!({ "id": id, "result": result }),
                Err(message) => json!({ "id": id, "error": { "code": -32601, "message": message } }),
            };
            if ws_sender.send(Message::Text(response.to_string())).await.is_err() {
                break;
            }

            if method == "Page.navigate" {
                let dialog = json!({
                    "method": "Page.javascriptDialogOpening",
                    "params": { "type": "beforeunload", "message": "Leave site?" }
                });
                if ws_sender.send(Message::Text(dialog.to_string())).await.is_err() {
                    break;
                }
            }
        }
    }

    fn evaluate(expression: &str, url: &str) -> Value {
        let remote = if expression == "window.location.href" {
            json!({ "type": "string", "value": url })
        } else if expression == "document.readyState" {
            json!({ "type": "string", "value": "complete" })
        } else if expression.contains("nope") {
            json!({ "type": "object", "subtype": "null", "value": null })
        } else if expression.ends_with(".length") {
            json!({ "type": "number", "value": 2 })
        } else if expression.starts_with("throw") {
            return json!({
                "result": { "type": "object" },
                "exceptionDetails": {
                    "text": "Uncaught",
                    "exception": { "type": "object", "description": "Error: boom" }
                }
            });
        } else {
            json!({
                "type": "object",
                "value": { "text": "  Sign in to Example ", "visible": true, "enabled": true, "x": 40.5, "y": 12.0 }
            })
        };
        json!({ "result": remote })
    }
}

impl Drop for MockChromeServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn attach(server: &MockChromeServer, options: &BrowserOptions) -> CdpDriver {
    let browser = Arc::new(CdpBrowserImpl::new(server.target_url()));
    CdpDriver::attach(browser, &server.target_url(), options)
        .await
        .unwrap()
}

/// Poll until `method` was received, for at most two seconds
async fn wait_for_method(server: &MockChromeServer, method: &str) -> bool {
    for _ in 0..40 {
        if server.methods().iter().any(|m| m == method) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_attach_enables_domains() {
    let server = MockChromeServer::start().await.unwrap();
    let _driver = attach(&server, &BrowserOptions::default()).await;

    let methods = server.methods();
    assert!(methods.contains(&"Page.enable".to_string()));
    assert!(methods.contains(&"Runtime.enable".to_string()));
}

#[tokio::test]
async fn test_navigate_and_current_url() {
    let server = MockChromeServer::start().await.unwrap();
    let driver = attach(&server, &BrowserOptions::default()).await;

    let url = common::login_data_url();
    driver.navigate(&url).await.unwrap();

    assert_eq!(driver.current_url().await.unwrap(), url);
    assert_eq!(server.params("Page.navigate")[0]["url"], url.as_str());
}

#[tokio::test]
async fn test_dialogs_are_dismissed() {
    let server = MockChromeServer::start().await.unwrap();
    let driver = attach(&server, &BrowserOptions::default()).await;

    driver.navigate("https://example.slack.com/").await.unwrap();

    assert!(wait_for_method(&server, "Page.handleJavaScriptDialog").await);
    assert_eq!(server.params("Page.handleJavaScriptDialog")[0]["accept"], false);
}

#[tokio::test]
async fn test_dialogs_left_alone_when_disabled() {
    let server = MockChromeServer::start().await.unwrap();
    let options = BrowserOptions {
        dismiss_dialogs: false,
        ..BrowserOptions::default()
    };
    let driver = attach(&server, &options).await;

    driver.navigate("https://example.slack.com/").await.unwrap();

    assert!(!wait_for_method(&server, "Page.handleJavaScriptDialog").await);
}

#[tokio::test]
async fn test_element_state_and_count() {
    let server = MockChromeServer::start().await.unwrap();
    let driver = attach(&server, &BrowserOptions::default()).await;
    let header = Locator::tag_name("h1");

    assert_eq!(driver.count(&header).await.unwrap(), 2);

    let state = driver.state(&header, 0).await.unwrap();
    assert_eq!(state.text, "  Sign in to Example ");
    assert!(state.visible && state.enabled);
}

#[tokio::test]
async fn test_missing_element() {
    let server = MockChromeServer::start().await.unwrap();
    let driver = attach(&server, &BrowserOptions::default()).await;

    let err = driver.click(&Locator::css(".nope"), 0).await.unwrap_err();
    assert!(matches!(err, Error::ElementNotFound(_)));
}

#[tokio::test]
async fn test_script_exception() {
    let server = MockChromeServer::start().await.unwrap();
    let driver = attach(&server, &BrowserOptions::default()).await;

    let err = driver.evaluate("throw new Error('boom')").await.unwrap_err();
    assert!(matches!(err, Error::ScriptExecutionFailed(ref m) if m.contains("boom")));
}

#[tokio::test]
async fn test_synthetic_input_uses_scripts_only() {
    let server = MockChromeServer::start().await.unwrap();
    let driver = attach(&server, &BrowserOptions::default()).await;
    let input = Locator::css("[aria-label^=Message]");

    driver.click(&input, 0).await.unwrap();
    driver.type_text(&input, 0, "hello").await.unwrap();
    driver.press_key(&input, 0, Key::Enter).await.unwrap();

    assert!(!server.methods().iter().any(|m| m.starts_with("Input.")));
}

#[tokio::test]
async fn test_native_input_dispatches_events() {
    let server = MockChromeServer::start().await.unwrap();
    let options = BrowserOptions {
        native_events: true,
        ..BrowserOptions::default()
    };
    let driver = attach(&server, &options).await;
    let input = Locator::css("[aria-label^=Message]");

    driver.click(&input, 0).await.unwrap();
    driver.type_text(&input, 0, "hello").await.unwrap();
    driver.press_key(&input, 0, Key::Enter).await.unwrap();

    let mouse = server.params("Input.dispatchMouseEvent");
    let kinds: Vec<_> = mouse.iter().map(|p| p["type"].as_str().unwrap().to_string()).collect();
    assert_eq!(kinds, vec!["mouseMoved", "mousePressed", "mouseReleased"]);
    assert_eq!(mouse[1]["x"], 40.5);
    assert_eq!(mouse[1]["button"], "left");

    assert_eq!(server.params("Input.insertText")[0]["text"], "hello");

    let keys = server.params("Input.dispatchKeyEvent");
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0]["type"], "keyDown");
    assert_eq!(keys[0]["windowsVirtualKeyCode"], 13);
    assert_eq!(keys[0]["text"], "\r");
    assert!(keys[1].get("text").is_none());
}

#[tokio::test]
async fn test_screenshot_and_viewport() {
    let server = MockChromeServer::start().await.unwrap();
    let driver = attach(&server, &BrowserOptions::default()).await;

    let png = driver.screenshot().await.unwrap();
    assert_eq!(&png[1..4], b"PNG");

    driver.set_viewport(1440, 900).await.unwrap();
    let params = server.params("Emulation.setDeviceMetricsOverride");
    assert_eq!(params[0]["width"], 1440);
    assert_eq!(params[0]["height"], 900);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let server = MockChromeServer::start().await.unwrap();
    let driver = attach(&server, &BrowserOptions::default()).await;

    driver.close().await.unwrap();
    driver.close().await.unwrap();

    assert!(driver.current_url().await.is_err());
}
