use crate::report::finding::Severity;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive date bounds applied to temporal plausibility checks when no
/// extraction window constrains the run. The upper bound defaults to the
/// moment of the check when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateBounds {
    pub start: NaiveDate,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateBounds {
    pub fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self
            .start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = self
            .end
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        (start, end)
    }
}

/// Foreign-key style relationship: values in `column` must appear in
/// `references_column` of another configured source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub column: String,
    pub references_source: String,
    pub references_column: String,
}

/// Quality thresholds for one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Fewer extracted rows than this fails critical.
    pub min_rows: usize,
    /// Null fraction above this on a critical column fails critical.
    pub max_null_fraction: f64,
    pub critical_columns: Vec<String>,
    /// Plausibility bounds for full or unwindowed runs.
    pub absolute_date_bounds: Option<DateBounds>,
    /// Duplicates are usually tolerable since dedup runs downstream.
    pub duplicate_severity: Severity,
    /// Unmatched foreign-key fraction above this fails critical.
    pub max_orphan_fraction: f64,
    pub relationships: Vec<Relationship>,
    /// Numeric columns expected to be non-negative (warning on violation).
    pub non_negative_columns: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_rows: 1,
            max_null_fraction: 0.01,
            critical_columns: Vec::new(),
            absolute_date_bounds: None,
            duplicate_severity: Severity::Warning,
            max_orphan_fraction: 0.0,
            relationships: Vec::new(),
            non_negative_columns: Vec::new(),
        }
    }
}
