//! Chrome DevTools Protocol driver
//!
//! Elements are resolved by injected DOM scripts on every call. Input is
//! DOM-dispatched by default; with `native_events` clicks, hovers and keys go
//! through `Input.dispatch*` at the element's center instead.

use super::locator::{Key, Locator};
use super::scripts::{count_script, DomScript};
use super::traits::{BrowserOptions, Driver, ElementState, Launcher};
use crate::cdp::types::{KeyEventParams, MouseEventParams};
use crate::cdp::{CdpBrowser, CdpBrowserImpl, CdpClient, ChromeProcess};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Driver over one CDP page target
#[derive(Debug)]
pub struct CdpDriver {
    client: Arc<dyn CdpClient>,
    browser: Arc<dyn CdpBrowser>,
    target_id: String,
    native_events: bool,
    process: Mutex<Option<ChromeProcess>>,
    dialog_watcher: std::sync::Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl CdpDriver {
    /// Connect to the page target behind `target_url`
    pub async fn attach(
        browser: Arc<dyn CdpBrowser>,
        target_url: &str,
        options: &BrowserOptions,
    ) -> Result<Self> {
        let client = browser.create_client(target_url).await?;
        let target_id = target_url.rsplit('/').next().unwrap_or_default().to_string();

        let dialog_watcher = if options.dismiss_dialogs {
            Some(Self::watch_dialogs(Arc::clone(&client)).await?)
        } else {
            None
        };

        Ok(Self {
            client,
            browser,
            target_id,
            native_events: options.native_events,
            process: Mutex::new(None),
            dialog_watcher: std::sync::Mutex::new(dialog_watcher),
            closed: AtomicBool::new(false),
        })
    }

    /// Make the driver own (and eventually kill) a launched Chrome
    pub fn with_process(self, process: ChromeProcess) -> Self {
        Self {
            process: Mutex::new(Some(process)),
            ..self
        }
    }

    async fn watch_dialogs(client: Arc<dyn CdpClient>) -> Result<JoinHandle<()>> {
        let mut dialogs = client.subscribe_events("Page.javascriptDialogOpening").await?;

        Ok(tokio::spawn(async move {
            while let Some(event) = dialogs.recv().await {
                let kind = event.params.get("type").and_then(|v| v.as_str()).unwrap_or("dialog");
                let message = event.params.get("message").and_then(|v| v.as_str()).unwrap_or("");
                info!("Dismissing {} dialog: {}", kind, message);

                if let Err(e) = client
                    .call_method("Page.handleJavaScriptDialog", json!({ "accept": false }))
                    .await
                {
                    warn!("Failed to dismiss {} dialog: {}", kind, e);
                }
            }
        }))
    }

    /// Drop cookies and cache of a reused browser
    pub async fn clear_browsing_data(&self) -> Result<()> {
        self.client
            .call_method("Network.clearBrowserCookies", json!({}))
            .await?;
        self.client
            .call_method("Network.clearBrowserCache", json!({}))
            .await?;
        Ok(())
    }

    async fn element_script(&self, locator: &Locator, index: usize, script: String) -> Result<Value> {
        let value = self.evaluate(&script).await?;
        if value.is_null() {
            return Err(Error::element_not_found(format!("{} [{}]", locator, index)));
        }
        Ok(value)
    }

    async fn center(&self, locator: &Locator, index: usize) -> Result<(f64, f64)> {
        let point = self
            .element_script(locator, index, DomScript::new(locator, index).center())
            .await?;
        let coordinate = |axis: &str| {
            point
                .get(axis)
                .and_then(|v| v.as_f64())
                .ok_or_else(|| Error::script_execution_failed(format!("No {} coordinate for {}", axis, locator)))
        };
        Ok((coordinate("x")?, coordinate("y")?))
    }

    async fn mouse_event(&self, event_type: &str, x: f64, y: f64, button: bool) -> Result<()> {
        let params = MouseEventParams {
            event_type: event_type.to_string(),
            x,
            y,
            button: button.then(|| "left".to_string()),
            click_count: button.then_some(1),
        };
        self.client
            .call_method("Input.dispatchMouseEvent", serde_json::to_value(params)?)
            .await?;
        Ok(())
    }

    async fn key_event(&self, event_type: &str, key: Key) -> Result<()> {
        let params = KeyEventParams {
            event_type: event_type.to_string(),
            key: key.name().to_string(),
            code: key.code().to_string(),
            windows_virtual_key_code: key.key_code(),
            text: if event_type == "keyDown" {
                key.text().map(|t| t.to_string())
            } else {
                None
            },
        };
        self.client
            .call_method("Input.dispatchKeyEvent", serde_json::to_value(params)?)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.client.navigate(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let value = self.evaluate("window.location.href").await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::script_execution_failed("window.location.href is not a string"))
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        Ok(self.client.evaluate(script, true).await?.into())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let value = self.evaluate(&count_script(locator)).await?;
        value
            .as_f64()
            .map(|n| n as usize)
            .ok_or_else(|| Error::script_execution_failed(format!("Count of {} is not a number", locator)))
    }

    async fn state(&self, locator: &Locator, index: usize) -> Result<ElementState> {
        let value = self
            .element_script(locator, index, DomScript::new(locator, index).state())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn click(&self, locator: &Locator, index: usize) -> Result<()> {
        debug!("Clicking {} [{}]", locator, index);
        if self.native_events {
            let (x, y) = self.center(locator, index).await?;
            self.mouse_event("mouseMoved", x, y, false).await?;
            self.mouse_event("mousePressed", x, y, true).await?;
            self.mouse_event("mouseReleased", x, y, true).await?;
            return Ok(());
        }
        self.element_script(locator, index, DomScript::new(locator, index).click())
            .await?;
        Ok(())
    }

    async fn clear(&self, locator: &Locator, index: usize) -> Result<()> {
        self.element_script(locator, index, DomScript::new(locator, index).clear())
            .await?;
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, index: usize, text: &str) -> Result<()> {
        let script = DomScript::new(locator, index);
        if self.native_events {
            self.element_script(locator, index, script.focus()).await?;
            self.client
                .call_method("Input.insertText", json!({ "text": text }))
                .await?;
            return Ok(());
        }
        self.element_script(locator, index, script.type_text(text)).await?;
        Ok(())
    }

    async fn press_key(&self, locator: &Locator, index: usize, key: Key) -> Result<()> {
        let script = DomScript::new(locator, index);
        if self.native_events {
            self.element_script(locator, index, script.focus()).await?;
            self.key_event("keyDown", key).await?;
            self.key_event("keyUp", key).await?;
            return Ok(());
        }
        self.element_script(locator, index, script.press_key(key)).await?;
        Ok(())
    }

    async fn hover(&self, locator: &Locator, index: usize) -> Result<()> {
        if self.native_events {
            let (x, y) = self.center(locator, index).await?;
            return self.mouse_event("mouseMoved", x, y, false).await;
        }
        self.element_script(locator, index, DomScript::new(locator, index).hover())
            .await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.client.screenshot().await
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        self.client
            .call_method(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": width,
                    "height": height,
                    "deviceScaleFactor": 0,
                    "mobile": false,
                }),
            )
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Ok(mut watcher) = self.dialog_watcher.lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }

        let process = self.process.lock().await.take();
        match process {
            Some(process) => {
                self.browser.close().await?;
                process.kill().await?;
            }
            None => {
                if let Err(e) = self.browser.close_target(&self.target_id).await {
                    warn!("Failed to close target {}: {}", self.target_id, e);
                }
                self.browser.close().await?;
            }
        }

        info!("Browser session closed");
        Ok(())
    }
}

/// Launches Chrome, or attaches to `cdp_endpoint` when one is configured
#[derive(Debug, Default, Clone)]
pub struct CdpLauncher;

impl CdpLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Open a fresh page target on `browser` and attach a driver to it.
    ///
    /// A browser reached through `cdp_endpoint` gets its cookies and cache
    /// dropped when `clean_session` is set. The new target is closed again
    /// if attaching or clearing fails.
    pub async fn open_page(browser: Arc<dyn CdpBrowser>, options: &BrowserOptions) -> Result<CdpDriver> {
        let target_url = browser.create_target("about:blank").await?;
        let driver = match CdpDriver::attach(Arc::clone(&browser), &target_url, options).await {
            Ok(driver) => driver,
            Err(e) => {
                let target_id = target_url.rsplit('/').next().unwrap_or_default();
                if let Err(close_err) = browser.close_target(target_id).await {
                    warn!("Failed to close target {}: {}", target_id, close_err);
                }
                return Err(e);
            }
        };

        if options.clean_session && options.cdp_endpoint.is_some() {
            if let Err(e) = driver.clear_browsing_data().await {
                if let Err(close_err) = driver.close().await {
                    warn!("Failed to close target after clearing browsing data failed: {}", close_err);
                }
                return Err(e);
            }
        }

        Ok(driver)
    }
}

#[async_trait]
impl Launcher for CdpLauncher {
    async fn launch(&self, options: &BrowserOptions) -> Result<Arc<dyn Driver>> {
        let process = match &options.cdp_endpoint {
            Some(_) => None,
            None => Some(ChromeProcess::spawn(options).await?),
        };

        let endpoint = match (&process, &options.cdp_endpoint) {
            (Some(process), _) => process.ws_endpoint().to_string(),
            (None, Some(endpoint)) => endpoint.clone(),
            (None, None) => return Err(Error::session_launch("No DevTools endpoint")),
        };

        let browser: Arc<dyn CdpBrowser> = Arc::new(CdpBrowserImpl::new(endpoint));
        let attached = match Self::open_page(Arc::clone(&browser), options).await {
            Ok(driver) => driver,
            Err(e) => {
                if let Some(process) = process {
                    let _ = process.kill().await;
                }
                return Err(e);
            }
        };

        let driver = match process {
            Some(process) => attached.with_process(process),
            None => attached,
        };

        Ok(Arc::new(driver))
    }
}
