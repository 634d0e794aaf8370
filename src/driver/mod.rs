//! # Driver layer
//!
//! The automation contract the session and page layers are written against.
//!
//! ## Modules
//! - `locator`: `Locator`, `Key`, XPath literal quoting
//! - `traits`: `Driver`, `Launcher`, `BrowserOptions`, `ElementState`
//! - `scripts`: DOM scripts that re-resolve locators on every call
//! - `cdp`: `CdpDriver` and `CdpLauncher` over the Chrome DevTools Protocol
//! - `mock`: `MockDriver` and `MockLauncher` for tests

pub mod locator;
pub mod traits;
pub mod scripts;
pub mod cdp;
pub mod mock;

pub use locator::{xpath_literal, Key, Locator};
pub use traits::{BrowserOptions, Driver, ElementState, Launcher};

pub use cdp::{CdpDriver, CdpLauncher};
pub use mock::{MockAction, MockDom, MockDriver, MockElement, MockEvent, MockLauncher};
