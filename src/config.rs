//! Configuration management for slack-e2e

use crate::browser::wait::{WaitConfig, WaitSettings};
use crate::driver::BrowserOptions;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_FILE_VAR: &str = "SLACK_E2E_CONFIG";

/// Suite configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attach to an already running browser instead of launching one
    /// (e.g., "ws://localhost:9222")
    pub cdp_endpoint: Option<String>,

    /// Chrome executable path
    pub chrome_path: Option<String>,

    /// Run Chrome without a window
    pub headless: bool,

    /// Drive input through `Input.dispatch*` instead of DOM events
    pub native_events: bool,

    /// Default viewport width
    pub window_width: u32,

    /// Default viewport height
    pub window_height: u32,

    /// Default wait timeout in seconds
    pub wait_timeout_secs: u64,

    /// Default poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Timeout of the search results wait in seconds
    pub search_timeout_secs: u64,

    /// Poll interval of the search results wait in seconds
    pub search_poll_interval_secs: u64,

    /// Minimum spacing between two search re-submissions in seconds
    pub search_resubmit_interval_secs: u64,

    /// Directory receiving report.json, rerun.txt and attachments
    pub report_dir: String,

    /// Scenario tag expression
    pub tags: String,

    /// Maximum number of scenarios running at once
    pub parallelism: usize,

    /// Log level
    pub log_level: String,

    /// Named runtime flags (workspace_url, user_email, user_pwd, ...)
    pub flags: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cdp_endpoint: None,
            chrome_path: None,
            headless: false,
            native_events: false,
            window_width: 1440,
            window_height: 900,
            wait_timeout_secs: 30,
            poll_interval_ms: 500,
            search_timeout_secs: 120,
            search_poll_interval_secs: 5,
            search_resubmit_interval_secs: 5,
            report_dir: "target/slack-e2e".to_string(),
            tags: "not @Ignore".to_string(),
            parallelism: 2,
            log_level: "info".to_string(),
            flags: HashMap::new(),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::configuration(format!("Invalid {}", name))),
        None => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))
    }

    /// File named by `SLACK_E2E_CONFIG` (if any), then environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match env::var(CONFIG_FILE_VAR) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Config::default(),
        };
        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Override fields from `SLACK_E2E_*` variables resolved through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(endpoint) = lookup("SLACK_E2E_CDP_ENDPOINT") {
            self.cdp_endpoint = Some(endpoint);
        }

        if let Some(chrome_path) = lookup("SLACK_E2E_CHROME_PATH") {
            self.chrome_path = Some(chrome_path);
        }

        if let Some(headless) = parse_var(&lookup, "SLACK_E2E_HEADLESS")? {
            self.headless = headless;
        }

        if let Some(native) = parse_var(&lookup, "SLACK_E2E_NATIVE_EVENTS")? {
            self.native_events = native;
        }

        if let Some(width) = parse_var(&lookup, "SLACK_E2E_WINDOW_WIDTH")? {
            self.window_width = width;
        }

        if let Some(height) = parse_var(&lookup, "SLACK_E2E_WINDOW_HEIGHT")? {
            self.window_height = height;
        }

        if let Some(timeout) = parse_var(&lookup, "SLACK_E2E_WAIT_TIMEOUT")? {
            self.wait_timeout_secs = timeout;
        }

        if let Some(interval) = parse_var(&lookup, "SLACK_E2E_POLL_INTERVAL_MS")? {
            self.poll_interval_ms = interval;
        }

        if let Some(timeout) = parse_var(&lookup, "SLACK_E2E_SEARCH_TIMEOUT")? {
            self.search_timeout_secs = timeout;
        }

        if let Some(interval) = parse_var(&lookup, "SLACK_E2E_SEARCH_POLL_INTERVAL")? {
            self.search_poll_interval_secs = interval;
        }

        if let Some(interval) = parse_var(&lookup, "SLACK_E2E_SEARCH_RESUBMIT_INTERVAL")? {
            self.search_resubmit_interval_secs = interval;
        }

        if let Some(dir) = lookup("SLACK_E2E_REPORT_DIR") {
            self.report_dir = dir;
        }

        if let Some(tags) = lookup("SLACK_E2E_TAGS") {
            self.tags = tags;
        }

        if let Some(parallelism) = parse_var::<usize>(&lookup, "SLACK_E2E_PARALLELISM")? {
            if parallelism == 0 {
                return Err(Error::configuration("SLACK_E2E_PARALLELISM must be at least 1"));
            }
            self.parallelism = parallelism;
        }

        if let Some(log_level) = lookup("SLACK_E2E_LOG_LEVEL") {
            self.log_level = log_level;
        }

        Ok(())
    }

    /// Launch options for one scenario's browser
    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: self.headless,
            window_width: self.window_width,
            window_height: self.window_height,
            chrome_path: self.chrome_path.clone(),
            cdp_endpoint: self.cdp_endpoint.clone(),
            native_events: self.native_events,
            ..Default::default()
        }
    }

    /// Wait budgets derived from the configured timeouts
    pub fn wait_settings(&self) -> WaitSettings {
        WaitSettings {
            default: WaitConfig::new(
                Duration::from_secs(self.wait_timeout_secs),
                Duration::from_millis(self.poll_interval_ms),
            ),
            search: WaitConfig::new(
                Duration::from_secs(self.search_timeout_secs),
                Duration::from_secs(self.search_poll_interval_secs),
            ),
            search_resubmit_interval: Duration::from_secs(self.search_resubmit_interval_secs),
        }
    }
}
