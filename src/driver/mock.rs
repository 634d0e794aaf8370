//! In-memory driver for tests
//!
//! `MockDriver` models a page as a URL, a ready-state sequence and a table
//! of elements per locator. Hooks registered per (locator, action) mutate
//! that model when the action happens, which is how tests script a fake
//! web app.

use super::locator::{Key, Locator};
use super::scripts::READY_STATE_SCRIPT;
use super::traits::{BrowserOptions, Driver, ElementState, Launcher};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// 1x1 PNG
const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53,
    0xDE,
];

/// Element of the mock page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    pub text: String,
    pub visible: bool,
    pub enabled: bool,
    /// Value typed into the element
    pub value: String,
}

impl MockElement {
    /// Visible, enabled element with `text`
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            visible: true,
            enabled: true,
            value: String::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Kinds of interaction a hook can react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockAction {
    Click,
    Hover,
    Clear,
    Type,
    Key(Key),
}

/// Interaction log entry
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Navigate(String),
    Click(Locator, usize),
    Hover(Locator, usize),
    Clear(Locator, usize),
    Type(Locator, usize, String),
    Key(Locator, usize, Key),
    Viewport(u32, u32),
    Screenshot,
    Closed,
}

/// Reaction to an interaction
pub type MockHook = Arc<dyn Fn(&mut MockDom) + Send + Sync>;

/// State of the mock page
pub struct MockDom {
    url: String,
    ready_states: VecDeque<String>,
    ready_state: String,
    elements: HashMap<Locator, Vec<MockElement>>,
    scripts: HashMap<String, Value>,
    hooks: HashMap<(Locator, MockAction), MockHook>,
    events: Vec<MockEvent>,
    fail_scripts: bool,
    fail_screenshots: bool,
    viewport: Option<(u32, u32)>,
    closed: bool,
}

impl fmt::Debug for MockDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDom")
            .field("url", &self.url)
            .field("ready_state", &self.ready_state)
            .field("elements", &self.elements)
            .field("hooks", &self.hooks.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Default for MockDom {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            ready_states: VecDeque::new(),
            ready_state: "complete".to_string(),
            elements: HashMap::new(),
            scripts: HashMap::new(),
            hooks: HashMap::new(),
            events: Vec::new(),
            fail_scripts: false,
            fail_screenshots: false,
            viewport: None,
            closed: false,
        }
    }
}

impl MockDom {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url<S: Into<String>>(&mut self, url: S) {
        self.url = url.into();
    }

    /// Ready states returned by successive polls; the last one sticks
    pub fn set_ready_states<I, S>(&mut self, states: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ready_states = states.into_iter().map(Into::into).collect();
        if let Some(last) = self.ready_states.pop_back() {
            self.ready_state = last;
        }
    }

    pub fn set_elements(&mut self, locator: Locator, elements: Vec<MockElement>) {
        self.elements.insert(locator, elements);
    }

    pub fn add_element(&mut self, locator: Locator, element: MockElement) {
        self.elements.entry(locator).or_default().push(element);
    }

    pub fn remove_elements(&mut self, locator: &Locator) {
        self.elements.remove(locator);
    }

    pub fn elements(&self, locator: &Locator) -> &[MockElement] {
        self.elements.get(locator).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn element_mut(&mut self, locator: &Locator, index: usize) -> Option<&mut MockElement> {
        self.elements.get_mut(locator).and_then(|e| e.get_mut(index))
    }

    /// Fixed result for an exact script
    pub fn set_script_result<S: Into<String>>(&mut self, script: S, value: Value) {
        self.scripts.insert(script.into(), value);
    }

    pub fn set_fail_scripts(&mut self, fail: bool) {
        self.fail_scripts = fail;
    }

    pub fn set_fail_screenshots(&mut self, fail: bool) {
        self.fail_screenshots = fail;
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn events(&self) -> &[MockEvent] {
        &self.events
    }

    fn next_ready_state(&mut self) -> String {
        self.ready_states
            .pop_front()
            .unwrap_or_else(|| self.ready_state.clone())
    }

    fn existing(&mut self, locator: &Locator, index: usize) -> Result<&mut MockElement> {
        self.element_mut(locator, index)
            .ok_or_else(|| Error::element_not_found(format!("{} [{}]", locator, index)))
    }

    fn fire(&mut self, locator: &Locator, action: MockAction) {
        let hook = self.hooks.get(&(locator.clone(), action)).cloned();
        if let Some(hook) = hook {
            hook(self);
        }
    }
}

/// Driver over a shared `MockDom`. Clones share the same page.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    dom: Arc<Mutex<MockDom>>,
    ready_state_checks: Arc<AtomicUsize>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the page model
    pub fn dom(&self) -> MutexGuard<'_, MockDom> {
        self.dom.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// React to `action` on `locator`
    pub fn on<F>(&self, locator: Locator, action: MockAction, hook: F)
    where
        F: Fn(&mut MockDom) + Send + Sync + 'static,
    {
        self.dom().hooks.insert((locator, action), Arc::new(hook));
    }

    /// How often `document.readyState` was evaluated
    pub fn ready_state_checks(&self) -> usize {
        self.ready_state_checks.load(Ordering::SeqCst)
    }

    /// Interaction log
    pub fn events(&self) -> Vec<MockEvent> {
        self.dom().events.clone()
    }

    fn interact<F>(&self, locator: &Locator, index: usize, action: MockAction, event: MockEvent, apply: F) -> Result<()>
    where
        F: FnOnce(&mut MockElement),
    {
        let mut dom = self.dom();
        apply(dom.existing(locator, index)?);
        dom.events.push(event);
        dom.fire(locator, action);
        Ok(())
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut dom = self.dom();
        dom.url = url.to_string();
        dom.events.push(MockEvent::Navigate(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.dom().url.clone())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let mut dom = self.dom();
        if dom.fail_scripts {
            return Err(Error::script_execution_failed(format!("Mock failure for: {}", script)));
        }
        if script == READY_STATE_SCRIPT {
            self.ready_state_checks.fetch_add(1, Ordering::SeqCst);
            return Ok(Value::String(dom.next_ready_state()));
        }
        Ok(dom.scripts.get(script).cloned().unwrap_or(Value::Null))
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.dom().elements(locator).len())
    }

    async fn state(&self, locator: &Locator, index: usize) -> Result<ElementState> {
        let mut dom = self.dom();
        let element = dom.existing(locator, index)?;
        Ok(ElementState {
            text: element.text.clone(),
            visible: element.visible,
            enabled: element.enabled,
        })
    }

    async fn click(&self, locator: &Locator, index: usize) -> Result<()> {
        self.interact(locator, index, MockAction::Click, MockEvent::Click(locator.clone(), index), |_| {})
    }

    async fn clear(&self, locator: &Locator, index: usize) -> Result<()> {
        self.interact(locator, index, MockAction::Clear, MockEvent::Clear(locator.clone(), index), |el| {
            el.value.clear()
        })
    }

    async fn type_text(&self, locator: &Locator, index: usize, text: &str) -> Result<()> {
        let event = MockEvent::Type(locator.clone(), index, text.to_string());
        self.interact(locator, index, MockAction::Type, event, |el| el.value.push_str(text))
    }

    async fn press_key(&self, locator: &Locator, index: usize, key: Key) -> Result<()> {
        let event = MockEvent::Key(locator.clone(), index, key);
        self.interact(locator, index, MockAction::Key(key), event, |_| {})
    }

    async fn hover(&self, locator: &Locator, index: usize) -> Result<()> {
        self.interact(locator, index, MockAction::Hover, MockEvent::Hover(locator.clone(), index), |_| {})
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let mut dom = self.dom();
        if dom.fail_screenshots {
            return Err(Error::cdp("Mock screenshot failure"));
        }
        dom.events.push(MockEvent::Screenshot);
        Ok(PNG_PIXEL.to_vec())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        let mut dom = self.dom();
        dom.viewport = Some((width, height));
        dom.events.push(MockEvent::Viewport(width, height));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut dom = self.dom();
        dom.closed = true;
        dom.events.push(MockEvent::Closed);
        Ok(())
    }
}

/// Launcher handing out drivers over one shared mock page
#[derive(Debug, Clone, Default)]
pub struct MockLauncher {
    driver: MockDriver,
    launches: Arc<AtomicUsize>,
    fail: bool,
}

impl MockLauncher {
    pub fn new(driver: MockDriver) -> Self {
        Self {
            driver,
            launches: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    /// Launcher whose every launch fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn driver(&self) -> &MockDriver {
        &self.driver
    }

    /// Number of sessions launched
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn launch(&self, _options: &BrowserOptions) -> Result<Arc<dyn Driver>> {
        if self.fail {
            return Err(Error::cdp("Mock launcher refuses to start a browser"));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.driver.dom().closed = false;
        Ok(Arc::new(self.driver.clone()))
    }
}
