//! # Chrome DevTools Protocol (CDP) layer
//!
//! WebSocket JSON-RPC plumbing between the suite and a Chrome page target.
//!
//! ## Modules
//! - `traits`: connection, client and browser interfaces
//! - `types`: wire structures
//! - `connection`: WebSocket connection with request/response routing and event fan-out
//! - `client`: typed commands (navigate, evaluate, screenshot, raw calls)
//! - `browser`: DevTools HTTP endpoints (`/json/new`, `/json/close`)
//! - `launcher`: local Chrome process with a fresh profile
//! - `mock`: recording client for tests
//!
//! ## Example
//! ```rust,no_run
//! use slack_e2e::cdp::{CdpBrowser, CdpBrowserImpl, CdpClient};
//!
//! # async fn example() -> slack_e2e::Result<()> {
//! let browser = CdpBrowserImpl::new("ws://localhost:9222");
//! let ws_url = browser.create_target("about:blank").await?;
//! let client = browser.create_client(&ws_url).await?;
//! client.navigate("https://app.slack.com/client").await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod launcher;
pub mod mock;

pub use traits::{
    CdpBrowser, CdpClient, CdpConnection, CdpError, CdpEvent, CdpResponse, EvaluationResult,
    NavigationResult,
};

pub use browser::CdpBrowserImpl;
pub use client::CdpClientImpl;
pub use connection::{CdpTimeoutConfig, CdpWebSocketConnection};
pub use launcher::ChromeProcess;

pub use mock::{MockCdpBrowser, MockCdpClient};
