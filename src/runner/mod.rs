//! # Scenario runner
//!
//! Runs the scenarios selected by the tag expression, each in its own tokio
//! task with its own browser, at most `parallelism` at a time. Steps inside
//! a scenario run in order; the first failing step ends the scenario, and
//! the after hook always runs.
//!
//! ## Modules
//! - `tags`: tag expression parsing and matching
//! - `scenario`: `Scenario`, `Step`
//! - `catalogue`: the built-in scenarios
//! - `report`: `ScenarioReport`, `RunReport`

pub mod tags;
pub mod scenario;
pub mod catalogue;
pub mod report;

pub use report::{RunReport, ScenarioReport, Status};
pub use scenario::{Scenario, Step};
pub use tags::TagExpr;

use crate::browser::{Browser, WaitSettings};
use crate::config::Config;
use crate::driver::{BrowserOptions, CdpLauncher, Launcher};
use crate::steps::{Flags, UiSteps};
use crate::{Error, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{error, info, warn};

const BEFORE_HOOK: &str = "Before hook";
const AFTER_HOOK: &str = "After hook";

#[derive(Debug, Clone)]
pub struct Runner {
    launcher: Arc<dyn Launcher>,
    options: BrowserOptions,
    waits: WaitSettings,
    flags: Flags,
    tags: TagExpr,
    tags_source: String,
    parallelism: usize,
    report_dir: PathBuf,
}

impl Runner {
    pub fn new(config: &Config, launcher: Arc<dyn Launcher>) -> Result<Self> {
        if config.parallelism == 0 {
            return Err(Error::configuration("parallelism must be at least 1"));
        }

        Ok(Self {
            launcher,
            options: config.browser_options(),
            waits: config.wait_settings(),
            flags: Flags::from_config(config),
            tags: config.tags.parse()?,
            tags_source: config.tags.clone(),
            parallelism: config.parallelism,
            report_dir: PathBuf::from(&config.report_dir),
        })
    }

    /// Runner launching Chrome over CDP
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config, Arc::new(CdpLauncher::new()))
    }

    /// Replace the flags, e.g. to run without environment fallback
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Scenarios whose tags match the tag expression, in order
    pub fn select(&self, scenarios: Vec<Scenario>) -> Vec<Scenario> {
        scenarios
            .into_iter()
            .filter(|s| self.tags.matches(&s.tags))
            .collect()
    }

    /// Run the selected scenarios and write the reports
    pub async fn run(&self, scenarios: Vec<Scenario>) -> Result<RunReport> {
        let started_at = Utc::now();
        let selected = self.select(scenarios);
        info!(
            "Running {} scenarios (tags: `{}`, parallelism: {})",
            selected.len(),
            self.tags_source,
            self.parallelism
        );

        let permits = Arc::new(Semaphore::new(self.parallelism));
        let mut tasks = Vec::with_capacity(selected.len());
        for scenario in selected {
            let runner = self.clone();
            let permits = Arc::clone(&permits);
            tasks.push(tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::internal(e.to_string()))?;
                Ok::<_, Error>(runner.run_scenario(scenario).await)
            }));
        }

        let mut reports = Vec::with_capacity(tasks.len());
        for task in tasks {
            let report = task
                .await
                .map_err(|e| Error::internal(format!("Scenario task failed: {}", e)))??;
            reports.push(report);
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            tags: self.tags_source.clone(),
            scenarios: reports,
        };
        report.write(&self.report_dir).await?;
        Ok(report)
    }

    /// Run one scenario in a fresh world
    pub async fn run_scenario(&self, scenario: Scenario) -> ScenarioReport {
        let started_at = Utc::now();
        let start = Instant::now();
        info!("Scenario started: {}", scenario.name);

        let browser = Browser::new(Arc::clone(&self.launcher), self.options.clone(), self.waits);
        let mut world = match UiSteps::new(browser, self.flags.clone()) {
            Ok(world) => world,
            Err(e) => {
                return self.failed_report(&scenario, started_at, start, BEFORE_HOOK, e, 0);
            }
        };

        let mut failure = match world.start().await {
            Ok(()) => None,
            Err(e) => Some((BEFORE_HOOK.to_string(), e)),
        };

        if failure.is_none() {
            for step in &scenario.steps {
                info!("Step: {}", step.name());
                if let Err(e) = step.run(&mut world).await {
                    failure = Some((step.name().to_string(), e));
                    break;
                }
            }
        }

        if let Err(e) = world.finish().await {
            warn!("After hook of `{}` failed: {}", scenario.name, e);
            failure.get_or_insert((AFTER_HOOK.to_string(), e));
        }

        let attachments = world.attachments();
        if let Err(e) = attachments.write_to(&self.report_dir, &scenario.name).await {
            warn!("Failed to write attachments of `{}`: {}", scenario.name, e);
        }

        match failure {
            Some((step, e)) => {
                self.failed_report(&scenario, started_at, start, &step, e, attachments.len())
            }
            None => {
                info!("Scenario passed: {}", scenario.name);
                ScenarioReport {
                    name: scenario.name.clone(),
                    tags: scenario.tags.clone(),
                    status: Status::Passed,
                    failed_step: None,
                    error: None,
                    started_at,
                    duration: start.elapsed(),
                    attachments: attachments.len(),
                }
            }
        }
    }

    fn failed_report(
        &self,
        scenario: &Scenario,
        started_at: chrono::DateTime<Utc>,
        start: Instant,
        step: &str,
        e: Error,
        attachments: usize,
    ) -> ScenarioReport {
        error!("Scenario failed: {} at `{}`: {}", scenario.name, step, e);
        ScenarioReport {
            name: scenario.name.clone(),
            tags: scenario.tags.clone(),
            status: Status::Failed,
            failed_step: Some(step.to_string()),
            error: Some(e.to_string()),
            started_at,
            duration: start.elapsed(),
            attachments,
        }
    }
}
