//! slack-e2e: browser-driven end-to-end tests for the Slack web client
//!
//! The suite drives Chrome over the Chrome DevTools Protocol. Page objects
//! and polling waits turn the asynchronous DOM into retryable assertions.

pub mod error;
pub mod config;

pub mod cdp;
pub mod driver;
pub mod browser;
pub mod pages;
pub mod steps;
pub mod runner;

// Re-exports
pub use error::{Error, Result};

/// slack-e2e library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
