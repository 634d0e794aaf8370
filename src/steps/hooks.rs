//! Scenario hooks: start the browser before, screenshot and quit after

use super::attachments::AttachmentSink;
use crate::browser::Browser;
use crate::Result;
use tracing::warn;

/// Start a session and bring the viewport to the configured size
pub async fn before_scenario(browser: &mut Browser) -> Result<()> {
    browser.start().await?;
    browser.resize_default().await
}

/// Capture a final screenshot, then quit. Runs whether or not the scenario passed.
pub async fn after_scenario(browser: &mut Browser, attachments: &mut AttachmentSink) -> Result<()> {
    if browser.is_active() {
        match browser.screenshot().await {
            Some(png) => attachments.attach_screenshot(png),
            None => warn!("No final screenshot for this scenario"),
        }
    }
    browser.quit().await
}
