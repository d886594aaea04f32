use crate::extraction::window::ExtractionWindow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the extraction window for a source-run is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// `[checkpoint watermark, now)`; first run falls back to the configured
    /// lookback, or the epoch when none is set.
    Incremental,
    /// No date predicate at all.
    Full,
    /// Caller-supplied bounds, end exclusive.
    Custom(ExtractionWindow),
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Incremental => write!(f, "incremental"),
            ExtractionMode::Full => write!(f, "full"),
            ExtractionMode::Custom(w) => write!(f, "custom {w}"),
        }
    }
}
