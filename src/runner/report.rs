//! Run reports: `report.json` with every scenario, `rerun.txt` with the failed ones

use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const REPORT_FILE: &str = "report.json";
pub const RERUN_FILE: &str = "rerun.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub tags: Vec<String>,
    pub status: Status,
    /// Step, or hook, that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    pub attachments: usize,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Outcome of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Tag expression scenarios were selected with
    pub tags: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn failed(&self) -> Vec<&ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.passed()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::passed)
    }

    /// Write `report.json` and `rerun.txt` into `dir`
    pub async fn write(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;

        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(dir.join(REPORT_FILE), json).await?;

        let rerun: String = self
            .failed()
            .iter()
            .map(|s| format!("{}\n", s.name))
            .collect();
        tokio::fs::write(dir.join(RERUN_FILE), rerun).await?;

        info!(
            "Report written to {} ({} passed, {} failed)",
            dir.display(),
            self.passed(),
            self.scenarios.len() - self.passed()
        );
        Ok(())
    }
}
