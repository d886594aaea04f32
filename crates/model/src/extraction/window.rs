use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open extraction window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExtractionWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn last_n_days(days: i64, now: DateTime<Utc>) -> Option<Self> {
        Self::new(now - Duration::days(days), now)
    }
}

impl fmt::Display for ExtractionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rejects_inverted_bounds() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(ExtractionWindow::new(t0, t1).is_none());
        assert!(ExtractionWindow::new(t0, t0).is_none());
    }

    #[test]
    fn last_n_days_rejects_non_positive_spans() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert!(ExtractionWindow::last_n_days(7, now).is_some());
        assert!(ExtractionWindow::last_n_days(0, now).is_none());
        assert!(ExtractionWindow::last_n_days(-1, now).is_none());
    }
}
