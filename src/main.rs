//! # slack-e2e runner
//!
//! Runs the built-in scenarios against a Slack workspace and writes
//! `report.json` and `rerun.txt` into the report directory.
//!
//! ## Environment variables
//! - `SLACK_E2E_CONFIG`: optional TOML configuration file
//! - `SLACK_E2E_*`: overrides of single settings (see `Config::apply_env`)
//! - `WORKSPACE_URL`, `USER_EMAIL`, `USER_PWD`: flags not set in the `[flags]` table
//! - `RUST_LOG`: log level, taking precedence over the configured one

use anyhow::Context;
use slack_e2e::{config::Config, runner::{catalogue, Runner}};
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::load().context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .or_else(|| config.log_level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set the default tracing subscriber")?;

    info!("slack-e2e v{}", slack_e2e::VERSION);
    info!(
        "Reports go to {}, headless: {}",
        config.report_dir, config.headless
    );

    let runner = Runner::from_config(&config)?;
    let report = tokio::select! {
        report = runner.run(catalogue::scenarios()) => report?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, browsers of running scenarios may be left open");
            return Ok(ExitCode::from(130));
        }
    };

    let failed = report.failed();
    if failed.is_empty() {
        info!("All {} scenarios passed", report.scenarios.len());
        return Ok(ExitCode::SUCCESS);
    }

    for scenario in &failed {
        error!(
            "FAILED {} at `{}`: {}",
            scenario.name,
            scenario.failed_step.as_deref().unwrap_or("?"),
            scenario.error.as_deref().unwrap_or("")
        );
    }
    error!("{} of {} scenarios failed", failed.len(), report.scenarios.len());
    Ok(ExitCode::FAILURE)
}
