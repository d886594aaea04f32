use crate::error::PlanError;
use crate::report::finding::{ValidationResult, Verdict};
use chrono::{DateTime, Utc};
use model::extraction::window::ExtractionWindow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Extract,
    Validate,
    Transform,
    Load,
    Commit,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Extract => write!(f, "EXTRACT"),
            Phase::Validate => write!(f, "VALIDATE"),
            Phase::Transform => write!(f, "TRANSFORM"),
            Phase::Load => write!(f, "LOAD"),
            Phase::Commit => write!(f, "COMMIT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Succeeded,
    /// Validation raised warnings (or an overridden critical) but the run
    /// completed through commit.
    Partial,
    Failed,
}

impl RunStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Succeeded => write!(f, "SUCCEEDED"),
            RunStatus::Partial => write!(f, "PARTIAL"),
            RunStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub elapsed_ms: u64,
}

impl PhaseTiming {
    pub fn new(phase: Phase, elapsed: Duration) -> Self {
        Self {
            phase,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Counters emitted by the transform stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransformStats {
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_dropped: usize,
    pub coercion_failures: usize,
}

/// Per-source record of one pipeline run, returned to the caller and
/// persisted as a JSON artifact for external alerting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub source: String,
    pub status: RunStatus,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<ExtractionWindow>,
    pub rows_extracted: usize,
    pub rows_loaded: usize,
    pub retries: usize,
    pub verdict: Option<Verdict>,
    pub validation: Vec<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformStats>,
    pub timings: Vec<PhaseTiming>,
    /// The failing phase, when the run did not complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Persists the summary as `<run_id>-<source>.json` under `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, PlanError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}-{}.json", self.run_id, self.source));
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn summary() -> RunSummary {
        RunSummary {
            run_id: "run-abc".into(),
            source: "orders".into(),
            status: RunStatus::Succeeded,
            mode: "incremental".into(),
            window: None,
            rows_extracted: 10,
            rows_loaded: 10,
            retries: 0,
            verdict: Some(Verdict::Clean),
            validation: Vec::new(),
            transform: Some(TransformStats::default()),
            timings: vec![PhaseTiming::new(Phase::Extract, Duration::from_millis(12))],
            failed_phase: None,
            error: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn writes_summary_artifact() {
        let dir = tempdir().unwrap();
        let path = summary().write_to(dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), "run-abc-orders.json");
        let text = fs::read_to_string(path).unwrap();
        let parsed: RunSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.source, "orders");
        assert_eq!(parsed.status, RunStatus::Succeeded);
    }
}
