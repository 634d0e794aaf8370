//! # Session manager
//!
//! `Browser` owns the lifecycle of one browser session per scenario. Pages
//! and steps work through the cheap `Session` handle it hands out.
//!
//! ## Modules
//! - `wait`: `Wait`, `WaitConfig`, `WaitSettings`
//! - `session`: `Session`
//! - `element`: `Element`, `Elements`
//! - `conditions`: expected conditions for waits

pub mod wait;
pub mod session;
pub mod element;
pub mod conditions;

pub use element::{Element, Elements};
pub use session::Session;
pub use wait::{Wait, WaitConfig, WaitSettings};

use crate::config::Config;
use crate::driver::{BrowserOptions, CdpLauncher, Launcher};
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Lifecycle of a single browser session
#[derive(Debug)]
pub struct Browser {
    launcher: Arc<dyn Launcher>,
    options: BrowserOptions,
    waits: WaitSettings,
    session: Option<Session>,
}

impl Browser {
    pub fn new(launcher: Arc<dyn Launcher>, options: BrowserOptions, waits: WaitSettings) -> Self {
        Self {
            launcher,
            options,
            waits,
            session: None,
        }
    }

    /// Browser driving Chrome over CDP, configured from `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(CdpLauncher::new()),
            config.browser_options(),
            config.wait_settings(),
        )
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    /// Start a session unless one is already active
    pub async fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let driver = self
            .launcher
            .launch(&self.options)
            .await
            .map_err(|e| Error::session_launch(e.to_string()))?;

        info!(
            "Browser session started (headless: {}, native events: {})",
            self.options.headless, self.options.native_events
        );
        self.session = Some(Session::new(driver, self.waits));
        Ok(())
    }

    /// Close the session, if any. A later `start` creates a new one.
    pub async fn quit(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        session.driver().close().await?;
        info!("Browser session closed");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Result<Session> {
        self.session.clone().ok_or(Error::NoActiveSession)
    }

    pub async fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.session()?.driver().set_viewport(width, height).await
    }

    /// Resize to the configured window size
    pub async fn resize_default(&self) -> Result<()> {
        self.resize(self.options.window_width, self.options.window_height)
            .await
    }

    pub fn wait(&self) -> Result<Wait<'static>> {
        Ok(self.session()?.wait())
    }

    pub fn wait_for(&self, timeout: Duration) -> Result<Wait<'static>> {
        Ok(self.session()?.wait_for(timeout))
    }

    /// Best-effort script evaluation; `Null` without a session or on failure
    pub async fn execute(&self, script: &str, args: &[Value]) -> Value {
        match &self.session {
            Some(session) => session.execute(script, args).await,
            None => {
                warn!("Cannot execute script without an active session");
                Value::Null
            }
        }
    }

    /// PNG of the viewport, `None` without a session or on failure
    pub async fn screenshot(&self) -> Option<Vec<u8>> {
        match &self.session {
            Some(session) => session.screenshot().await,
            None => None,
        }
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.session()?.navigate(url).await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.session()?.current_url().await
    }
}
