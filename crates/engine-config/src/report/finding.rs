use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Outcome of one quality check against an extracted dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub check: String,
    pub severity: Severity,
    pub passed: bool,
    pub affected_rows: usize,
    pub detail: String,
}

impl ValidationResult {
    pub fn pass(check: &str, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            severity,
            passed: true,
            affected_rows: 0,
            detail: detail.into(),
        }
    }

    pub fn fail(
        check: &str,
        severity: Severity,
        affected_rows: usize,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            check: check.to_string(),
            severity,
            passed: false,
            affected_rows,
            detail: detail.into(),
        }
    }
}

/// Aggregate verdict over an ordered list of check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Clean,
    Warning,
    Critical,
}

impl Verdict {
    pub fn aggregate(results: &[ValidationResult]) -> Self {
        let mut verdict = Verdict::Clean;
        for result in results.iter().filter(|r| !r.passed) {
            match result.severity {
                Severity::Critical => return Verdict::Critical,
                Severity::Warning => verdict = Verdict::Warning,
            }
        }
        verdict
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Verdict::Critical)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Clean => write!(f, "clean"),
            Verdict::Warning => write!(f, "warning"),
            Verdict::Critical => write!(f, "critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_prefers_critical_over_warning() {
        let results = vec![
            ValidationResult::pass("row_count_floor", Severity::Critical, "ok"),
            ValidationResult::fail("duplicate_primary_keys", Severity::Warning, 3, "dupes"),
            ValidationResult::fail("null_rate", Severity::Critical, 50, "nulls"),
        ];
        assert_eq!(Verdict::aggregate(&results), Verdict::Critical);
    }

    #[test]
    fn verdict_clean_when_all_pass() {
        let results = vec![ValidationResult::pass(
            "row_count_floor",
            Severity::Critical,
            "ok",
        )];
        assert_eq!(Verdict::aggregate(&results), Verdict::Clean);
    }
}
