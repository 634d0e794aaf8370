//! Chrome process launcher
//!
//! Starts a local Chrome with an ephemeral DevTools port and a fresh profile
//! directory, then reads the browser WebSocket endpoint Chrome prints on
//! stderr.

use crate::driver::BrowserOptions;
use crate::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Switches every suite browser runs with
pub const CHROME_SWITCHES: &[&str] = &[
    "--silent",
    "--test-type",
    "--disable-extensions",
    "--disable-infobars",
    "--disable-plugins",
    "--disable-print-preview",
    "--no-first-run",
    "--no-default-browser-check",
];

const CHROME_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

const DEVTOOLS_PREFIX: &str = "DevTools listening on ";

const PROFILE_PREFIX: &str = "slack-e2e-profile-";

/// Command line for one browser session
pub fn chrome_args(options: &BrowserOptions, user_data_dir: &Path) -> Vec<String> {
    let mut args = vec![
        "--remote-debugging-port=0".to_string(),
        format!("--user-data-dir={}", user_data_dir.display()),
        format!("--window-size={},{}", options.window_width, options.window_height),
    ];
    args.extend(CHROME_SWITCHES.iter().map(|s| s.to_string()));
    if options.headless {
        args.push("--headless=new".to_string());
    }
    args.extend(options.args.iter().cloned());
    args.push("about:blank".to_string());
    args
}

/// Extract the endpoint from a "DevTools listening on ws://..." line
pub fn parse_devtools_line(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix(DEVTOOLS_PREFIX)
        .map(|endpoint| endpoint.trim().to_string())
        .filter(|endpoint| endpoint.starts_with("ws://"))
}

async fn read_devtools_endpoint<R>(stderr: R) -> Result<(String, Lines<BufReader<R>>)>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stderr).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(endpoint) = parse_devtools_line(&line) {
            return Ok((endpoint, lines));
        }
        debug!("chrome: {}", line);
    }
    Err(Error::session_launch(
        "Chrome exited before reporting a DevTools endpoint",
    ))
}

/// A running, suite-owned Chrome process.
///
/// The profile directory is removed when the process is dropped, on every
/// launch failure included.
#[derive(Debug)]
pub struct ChromeProcess {
    child: Child,
    ws_endpoint: String,
    user_data_dir: TempDir,
}

impl ChromeProcess {
    /// Launch Chrome and wait until its DevTools endpoint is known
    pub async fn spawn(options: &BrowserOptions) -> Result<Self> {
        Self::spawn_in(options, &std::env::temp_dir()).await
    }

    /// Launch Chrome with a fresh profile directory created under `parent`
    pub async fn spawn_in(options: &BrowserOptions, parent: &Path) -> Result<Self> {
        let user_data_dir = tempfile::Builder::new()
            .prefix(PROFILE_PREFIX)
            .tempdir_in(parent)?;

        let args = chrome_args(options, user_data_dir.path());
        let mut child = Self::spawn_child(options.chrome_path.as_deref(), &args)?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::session_launch("Chrome stderr is not captured"))?;

        let endpoint = tokio::time::timeout(options.launch_timeout, read_devtools_endpoint(stderr)).await;
        let (ws_endpoint, mut rest) = match endpoint {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(e);
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(Error::session_launch(format!(
                    "Chrome did not report a DevTools endpoint within {:?}",
                    options.launch_timeout
                )));
            }
        };

        // Keep draining stderr so Chrome never blocks on a full pipe
        tokio::spawn(async move {
            while let Ok(Some(line)) = rest.next_line().await {
                debug!("chrome: {}", line);
            }
        });

        info!("Chrome started, DevTools endpoint {}", ws_endpoint);

        Ok(Self {
            child,
            ws_endpoint,
            user_data_dir,
        })
    }

    fn spawn_child(chrome_path: Option<&str>, args: &[String]) -> Result<Child> {
        let candidates: Vec<&str> = match chrome_path {
            Some(path) => vec![path],
            None => CHROME_CANDIDATES.to_vec(),
        };

        for program in &candidates {
            let spawned = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn();

            match spawned {
                Ok(child) => {
                    debug!("Spawned {} with {:?}", program, args);
                    return Ok(child);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Chrome candidate {} not found", program);
                }
                Err(e) => {
                    return Err(Error::session_launch(format!("Failed to start {}: {}", program, e)));
                }
            }
        }

        Err(Error::session_launch(format!(
            "No Chrome executable found (tried {})",
            candidates.join(", ")
        )))
    }

    /// Browser-level WebSocket endpoint
    pub fn ws_endpoint(&self) -> &str {
        &self.ws_endpoint
    }

    /// Profile directory of this process
    pub fn user_data_dir(&self) -> &Path {
        self.user_data_dir.path()
    }

    /// Stop the process and delete its profile directory
    pub async fn kill(mut self) -> Result<()> {
        if let Err(e) = self.child.kill().await {
            // InvalidInput means the process already exited
            if e.kind() != std::io::ErrorKind::InvalidInput {
                return Err(e.into());
            }
        }

        let path = self.user_data_dir.path().to_path_buf();
        if let Err(e) = self.user_data_dir.close() {
            warn!("Failed to remove profile directory {}: {}", path.display(), e);
        }

        Ok(())
    }
}
