//! Browser automation driver contract
//!
//! Everything above this layer talks to the browser through `Driver`;
//! elements are addressed by (locator, index) and never by a cached node.

use super::locator::{Key, Locator};
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Launch options for one browser session
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run without a window
    pub headless: bool,
    /// Initial window width
    pub window_width: u32,
    /// Initial window height
    pub window_height: u32,
    /// Chrome executable, searched on PATH when unset
    pub chrome_path: Option<String>,
    /// Attach to this DevTools endpoint instead of launching Chrome
    pub cdp_endpoint: Option<String>,
    /// Extra command line switches
    pub args: Vec<String>,
    /// Dismiss alert/confirm/prompt dialogs as they open
    pub dismiss_dialogs: bool,
    /// Use `Input.dispatch*` instead of DOM-dispatched events
    pub native_events: bool,
    /// Fresh profile, or cleared cookies and cache when attaching
    pub clean_session: bool,
    /// How long Chrome may take to report its endpoint
    pub launch_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1440,
            window_height: 900,
            chrome_path: None,
            cdp_endpoint: None,
            args: Vec::new(),
            dismiss_dialogs: true,
            native_events: false,
            clean_session: true,
            launch_timeout: Duration::from_secs(30),
        }
    }
}

/// Snapshot of one element, read in a single round trip
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementState {
    /// Rendered text
    pub text: String,
    /// Displayed (not `display:none`, not hidden, non-zero size)
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
}

/// One live browser session.
///
/// Element operations take the locator and the index of the match; a match
/// that does not exist at call time fails with `ElementNotFound`.
#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// Navigate the page to `url`
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Live URL of the page
    async fn current_url(&self) -> Result<String>;

    /// Evaluate a JavaScript expression and return its JSON value
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Number of elements currently matching `locator`
    async fn count(&self, locator: &Locator) -> Result<usize>;

    /// Text, visibility and enabled state of the `index`-th match
    async fn state(&self, locator: &Locator, index: usize) -> Result<ElementState>;

    /// Click the `index`-th match
    async fn click(&self, locator: &Locator, index: usize) -> Result<()>;

    /// Clear the value of the `index`-th match
    async fn clear(&self, locator: &Locator, index: usize) -> Result<()>;

    /// Type `text` into the `index`-th match
    async fn type_text(&self, locator: &Locator, index: usize, text: &str) -> Result<()>;

    /// Press `key` on the `index`-th match
    async fn press_key(&self, locator: &Locator, index: usize, key: Key) -> Result<()>;

    /// Move the pointer over the `index`-th match
    async fn hover(&self, locator: &Locator, index: usize) -> Result<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Resize the viewport
    async fn set_viewport(&self, width: u32, height: u32) -> Result<()>;

    /// End the session and release the browser
    async fn close(&self) -> Result<()>;
}

/// Produces browser sessions
#[async_trait]
pub trait Launcher: Send + Sync + std::fmt::Debug {
    /// Start a new, independent session
    async fn launch(&self, options: &BrowserOptions) -> Result<Arc<dyn Driver>>;
}
