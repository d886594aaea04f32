use crate::error::PlanError;
use crate::settings::source::SourceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from(".tidemark/checkpoints.json")
}

fn default_summaries_dir() -> PathBuf {
    PathBuf::from(".tidemark/summaries")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".tidemark/output")
}

fn default_max_workers() -> usize {
    4
}

fn default_batch_size() -> usize {
    10_000
}

/// Raw plan document as loaded from disk. Structural rules are enforced by
/// `ValidatedPlan` before any run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionPlan {
    /// Connection string for the query-execution capability. Optional so
    /// plans can be inspected offline; required to actually run.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    #[serde(default = "default_summaries_dir")]
    pub summaries_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// First incremental run starts this many days back when no checkpoint
    /// exists. Unset means unbounded (full pull on first run).
    #[serde(default)]
    pub default_lookback_days: Option<i64>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    pub sources: Vec<SourceConfig>,
}

impl ExtractionPlan {
    pub fn from_file(path: &Path) -> Result<Self, PlanError> {
        let text = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let plan: ExtractionPlan = serde_json::from_str(&text)?;
        info!(
            "Loaded plan from {} ({} sources)",
            path.display(),
            plan.sources.len()
        );
        Ok(plan)
    }
}
