use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    /// The last run for this source committed successfully.
    Clean,
    /// A run currently holds the source (or died without cleanup).
    InProgress,
    /// The last run failed; the watermark still reflects the last success.
    Failed,
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointStatus::Clean => write!(f, "clean"),
            CheckpointStatus::InProgress => write!(f, "in_progress"),
            CheckpointStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Persisted per-source record. The watermark is monotonically
/// non-decreasing and only advances after a fully successful run; `None`
/// means no run has ever committed for this source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCheckpoint {
    pub last_extraction_watermark: Option<DateTime<Utc>>,
    pub last_run_id: String,
    pub status: CheckpointStatus,
}
