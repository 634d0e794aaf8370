//! Unified error types for slack-e2e

use std::time::Duration;
use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for slack-e2e
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The launcher could not produce a browser session
    #[error("Failed to launch browser session: {0}")]
    SessionLaunch(String),

    /// An operation needed a started browser session
    #[error("No active browser session")]
    NoActiveSession,

    /// `document.readyState` never reached "complete"
    #[error("Page got stuck in loading state at {url}")]
    PageLoadTimeout { url: String },

    /// The current URL matches no known page
    #[error("Could not determine page with current URL {url}")]
    UnknownPage { url: String },

    /// The current page is of another kind than the step expected
    #[error("Expected {expected} but the current URL {url} belongs to {actual}")]
    UnexpectedPage {
        expected: &'static str,
        actual: &'static str,
        url: String,
    },

    /// A login form field name that the page does not define
    #[error("{field} field is not defined at LoginPage")]
    UnknownField { field: String },

    /// A wait condition was not met within its timeout
    #[error("{message} (waited {timeout:?})")]
    WaitTimeout { message: String, timeout: Duration },

    /// Element not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A single protocol command exceeded its deadline
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// A runtime flag was empty or unset
    #[error("{0} flag value has not been provided")]
    MissingFlag(String),

    /// A step expectation did not hold
    #[error("{0}")]
    Assertion(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new session launch error
    pub fn session_launch<S: Into<String>>(msg: S) -> Self {
        Error::SessionLaunch(msg.into())
    }

    /// Create a new page load timeout error
    pub fn page_load_timeout<S: Into<String>>(url: S) -> Self {
        Error::PageLoadTimeout { url: url.into() }
    }

    /// Create a new unknown page error
    pub fn unknown_page<S: Into<String>>(url: S) -> Self {
        Error::UnknownPage { url: url.into() }
    }

    /// Create a new unknown field error
    pub fn unknown_field<S: Into<String>>(field: S) -> Self {
        Error::UnknownField {
            field: field.into(),
        }
    }

    /// Create a new wait timeout error
    pub fn wait_timeout<S: Into<String>>(message: S, timeout: Duration) -> Self {
        Error::WaitTimeout {
            message: message.into(),
            timeout,
        }
    }

    /// Create a new element not found error
    pub fn element_not_found<S: Into<String>>(id: S) -> Self {
        Error::ElementNotFound(id.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new missing flag error
    pub fn missing_flag<S: Into<String>>(flag: S) -> Self {
        Error::MissingFlag(flag.into())
    }

    /// Create a new assertion error
    pub fn assertion<S: Into<String>>(msg: S) -> Self {
        Error::Assertion(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether a wait should keep polling after this error.
    ///
    /// A DOM that is still rendering produces missing elements, failing
    /// scripts and protocol hiccups or stalled commands; everything else is
    /// a real failure.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::ElementNotFound(_)
                | Error::ScriptExecutionFailed(_)
                | Error::Cdp(_)
                | Error::Timeout(_)
        )
    }
}
