//! Handle to one started browser session

use super::element::{Element, Elements};
use super::wait::{Wait, WaitConfig, WaitSettings};
use crate::driver::scripts::with_arguments;
use crate::driver::{Driver, Locator};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Cheap, cloneable handle pages and steps work through
#[derive(Debug, Clone)]
pub struct Session {
    driver: Arc<dyn Driver>,
    waits: WaitSettings,
}

impl Session {
    pub fn new(driver: Arc<dyn Driver>, waits: WaitSettings) -> Self {
        Self { driver, waits }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn waits(&self) -> &WaitSettings {
        &self.waits
    }

    /// Wait with the default timeout and poll interval
    pub fn wait(&self) -> Wait<'static> {
        Wait::new(self.waits.default)
    }

    /// Wait with `timeout` and the default poll interval
    pub fn wait_for(&self, timeout: Duration) -> Wait<'static> {
        Wait::new(self.waits.default.with_timeout(timeout))
    }

    /// Wait with an explicit budget
    pub fn wait_with(&self, config: WaitConfig) -> Wait<'static> {
        Wait::new(config)
    }

    pub fn element(&self, locator: Locator) -> Element {
        Element::new(Arc::clone(&self.driver), locator, 0)
    }

    pub fn elements(&self, locator: Locator) -> Elements {
        Elements::new(Arc::clone(&self.driver), locator)
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.driver.navigate(url).await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.driver.current_url().await
    }

    /// Evaluate `script` with `args` available as `arguments`; any failure
    /// is logged and yields `Null`
    pub async fn execute(&self, script: &str, args: &[Value]) -> Value {
        match self.driver.evaluate(&with_arguments(script, args)).await {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to execute script `{}`: {}", script, e);
                Value::Null
            }
        }
    }

    /// PNG of the viewport; `None` (logged) if capture fails
    pub async fn screenshot(&self) -> Option<Vec<u8>> {
        match self.driver.screenshot().await {
            Ok(png) => Some(png),
            Err(e) => {
                warn!("Failed to capture screenshot: {}", e);
                None
            }
        }
    }
}
