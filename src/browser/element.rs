//! Lazily re-resolved element handles

use crate::driver::{Driver, ElementState, Key, Locator};
use crate::Result;
use std::sync::Arc;

/// The `index`-th match of a locator, looked up again on every call
#[derive(Debug, Clone)]
pub struct Element {
    driver: Arc<dyn Driver>,
    locator: Locator,
    index: usize,
}

impl Element {
    pub(crate) fn new(driver: Arc<dyn Driver>, locator: Locator, index: usize) -> Self {
        Self {
            driver,
            locator,
            index,
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub async fn state(&self) -> Result<ElementState> {
        self.driver.state(&self.locator, self.index).await
    }

    /// Rendered text, trimmed
    pub async fn text(&self) -> Result<String> {
        Ok(self.state().await?.text.trim().to_string())
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        Ok(self.state().await?.visible)
    }

    pub async fn click(&self) -> Result<()> {
        self.driver.click(&self.locator, self.index).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.driver.clear(&self.locator, self.index).await
    }

    pub async fn type_text(&self, text: &str) -> Result<()> {
        self.driver.type_text(&self.locator, self.index, text).await
    }

    pub async fn press(&self, key: Key) -> Result<()> {
        self.driver.press_key(&self.locator, self.index, key).await
    }

    /// Type `text`, then press `key`
    pub async fn send_keys(&self, text: &str, key: Key) -> Result<()> {
        self.type_text(text).await?;
        self.press(key).await
    }

    pub async fn hover(&self) -> Result<()> {
        self.driver.hover(&self.locator, self.index).await
    }
}

/// Every match of a locator, in document order
#[derive(Debug, Clone)]
pub struct Elements {
    driver: Arc<dyn Driver>,
    locator: Locator,
}

impl Elements {
    pub(crate) fn new(driver: Arc<dyn Driver>, locator: Locator) -> Self {
        Self { driver, locator }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub async fn count(&self) -> Result<usize> {
        self.driver.count(&self.locator).await
    }

    /// Handles for the matches present right now
    pub async fn all(&self) -> Result<Vec<Element>> {
        let count = self.count().await?;
        Ok((0..count).map(|index| self.nth(index)).collect())
    }

    pub fn nth(&self, index: usize) -> Element {
        Element::new(Arc::clone(&self.driver), self.locator.clone(), index)
    }

    /// Trimmed texts of the matches present right now
    pub async fn texts(&self) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        for element in self.all().await? {
            texts.push(element.text().await?);
        }
        Ok(texts)
    }
}
