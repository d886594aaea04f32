use crate::validation::checks::{
    date_range::DateRangePlausibility, duplicates::DuplicatePrimaryKeys, null_rate::NullRate,
    referential::ReferentialIntegrity, row_count::RowCountFloor,
    type_conformance::TypeConformance, value_range::ValueRangeSanity,
};
use crate::validation::{QualityCheck, ValidationContext};
use engine_config::report::finding::{ValidationResult, Verdict};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
    pub verdict: Verdict,
}

/// Runs an ordered battery of independent quality checks over an extracted
/// dataset. Checks never mutate the dataset or short-circuit each other.
pub struct ValidationEngine {
    checks: Vec<Box<dyn QualityCheck>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn add_check(mut self, check: impl QualityCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// The standard battery, in its fixed order.
    pub fn standard() -> Self {
        Self::new()
            .add_check(RowCountFloor)
            .add_check(NullRate)
            .add_check(DateRangePlausibility)
            .add_check(DuplicatePrimaryKeys)
            .add_check(ReferentialIntegrity)
            .add_check(TypeConformance)
            .add_check(ValueRangeSanity)
    }

    pub fn run(&self, ctx: &ValidationContext) -> ValidationReport {
        let mut results = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let result = check.evaluate(ctx);
            if result.passed {
                info!(
                    source = %ctx.dataset.source,
                    check = result.check,
                    "Check passed"
                );
            } else {
                warn!(
                    source = %ctx.dataset.source,
                    check = result.check,
                    severity = %result.severity,
                    affected_rows = result.affected_rows,
                    detail = %result.detail,
                    "Check failed"
                );
            }
            results.push(result);
        }

        let verdict = Verdict::aggregate(&results);
        info!(source = %ctx.dataset.source, verdict = %verdict, "Validation complete");

        ValidationReport { results, verdict }
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ReferenceSets;
    use chrono::{TimeZone, Utc};
    use engine_config::report::finding::Severity;
    use engine_config::settings::quality::Relationship;
    use engine_config::settings::source::{ColumnSpec, SourceConfig};
    use model::core::data_type::DataType;
    use model::core::identifiers::SourceId;
    use model::core::value::{FieldValue, Value};
    use model::extraction::window::ExtractionWindow;
    use model::records::dataset::{Dataset, ExtractionMetadata};
    use model::records::row::RowData;
    use std::collections::HashSet;

    fn config() -> SourceConfig {
        serde_json::from_value(serde_json::json!({
            "name": "visits",
            "query": "SELECT * FROM visits WHERE visit_date >= '{start_date}' AND visit_date < '{end_date}' LIMIT {batch_size} OFFSET {batch_offset}",
            "primary_key": ["id"],
            "date_column": "visit_date"
        }))
        .unwrap()
    }

    fn row(id: i64, visit_day: u32, duration: i64) -> RowData {
        RowData::new(
            "visits",
            vec![
                FieldValue::new("id", Value::Int(id)),
                FieldValue::new(
                    "visit_date",
                    Value::Timestamp(Utc.with_ymd_and_hms(2025, 3, visit_day, 12, 0, 0).unwrap()),
                ),
                FieldValue::new("duration", Value::Int(duration)),
                FieldValue::new("customer_id", Value::Int(id % 3)),
            ],
        )
    }

    fn dataset(rows: Vec<RowData>) -> Dataset {
        let window = ExtractionWindow::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
        );
        Dataset {
            source: SourceId::from("visits"),
            window,
            metadata: ExtractionMetadata {
                row_count: rows.len(),
                batch_count: 1,
                retries: 0,
                elapsed: std::time::Duration::ZERO,
                extracted_at: Utc::now(),
            },
            rows,
        }
    }

    fn run_battery(
        config: &SourceConfig,
        dataset: &Dataset,
        refs: &ReferenceSets,
    ) -> ValidationReport {
        let ctx = ValidationContext {
            dataset,
            config,
            reference_sets: refs,
            now: Utc::now(),
        };
        ValidationEngine::standard().run(&ctx)
    }

    #[test]
    fn clean_dataset_passes_all_checks() {
        let config = config();
        let data = dataset((1..=10).map(|i| row(i, 5, 30)).collect());
        let report = run_battery(&config, &data, &ReferenceSets::new());

        assert_eq!(report.verdict, Verdict::Clean);
        assert_eq!(report.results.len(), 7);
        assert!(report.results.iter().all(|r| r.passed));
    }

    #[test]
    fn null_rate_over_threshold_is_critical() {
        let mut config = config();
        config.quality.critical_columns = vec!["duration".into()];

        // 5 nulls out of 100 rows, against a 1% threshold.
        let mut rows: Vec<RowData> = (1..=95).map(|i| row(i, 5, 30)).collect();
        for i in 96..=100 {
            let mut r = row(i, 5, 30);
            r.field_values.retain(|f| f.name != "duration");
            r.push_field(FieldValue::null("duration", DataType::Int));
            rows.push(r);
        }

        let data = dataset(rows);
        let report = run_battery(&config, &data, &ReferenceSets::new());

        let null_check = report
            .results
            .iter()
            .find(|r| r.check == "null_rate")
            .unwrap();
        assert!(!null_check.passed);
        assert_eq!(null_check.severity, Severity::Critical);
        assert_eq!(null_check.affected_rows, 5);
        assert_eq!(report.verdict, Verdict::Critical);
    }

    #[test]
    fn duplicates_warn_by_default() {
        let config = config();
        let data = dataset(vec![row(1, 5, 30), row(1, 6, 45), row(2, 7, 10)]);
        let report = run_battery(&config, &data, &ReferenceSets::new());

        let dup = report
            .results
            .iter()
            .find(|r| r.check == "duplicate_primary_keys")
            .unwrap();
        assert!(!dup.passed);
        assert_eq!(dup.severity, Severity::Warning);
        assert_eq!(dup.affected_rows, 1);
        assert_eq!(report.verdict, Verdict::Warning);
    }

    #[test]
    fn out_of_window_dates_are_critical() {
        let config = config();
        let mut rows = vec![row(1, 5, 30)];
        rows.push(RowData::new(
            "visits",
            vec![
                FieldValue::new("id", Value::Int(2)),
                FieldValue::new(
                    "visit_date",
                    Value::Timestamp(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
                ),
                FieldValue::new("duration", Value::Int(5)),
            ],
        ));

        let data = dataset(rows);
        let report = run_battery(&config, &data, &ReferenceSets::new());

        let range = report
            .results
            .iter()
            .find(|r| r.check == "date_range_plausibility")
            .unwrap();
        assert!(!range.passed);
        assert_eq!(range.severity, Severity::Critical);
        assert_eq!(range.affected_rows, 1);
    }

    #[test]
    fn orphaned_foreign_keys_fail_critical() {
        let mut config = config();
        config.quality.relationships = vec![Relationship {
            column: "customer_id".into(),
            references_source: "customers".into(),
            references_column: "id".into(),
        }];

        let mut refs = ReferenceSets::new();
        // Only customer 0 exists; ids 1 and 2 are orphans.
        refs.insert(
            ("customers".into(), "id".into()),
            HashSet::from([Value::Int(0)]),
        );

        let data = dataset((1..=6).map(|i| row(i, 5, 30)).collect());
        let report = run_battery(&config, &data, &refs);

        let referential = report
            .results
            .iter()
            .find(|r| r.check == "referential_integrity")
            .unwrap();
        assert!(!referential.passed);
        assert_eq!(referential.severity, Severity::Critical);
        assert_eq!(referential.affected_rows, 4);
    }

    #[test]
    fn missing_reference_set_downgrades_to_warning() {
        let mut config = config();
        config.quality.relationships = vec![Relationship {
            column: "customer_id".into(),
            references_source: "customers".into(),
            references_column: "id".into(),
        }];

        let data = dataset(vec![row(1, 5, 30)]);
        let report = run_battery(&config, &data, &ReferenceSets::new());

        let referential = report
            .results
            .iter()
            .find(|r| r.check == "referential_integrity")
            .unwrap();
        assert!(!referential.passed);
        assert_eq!(referential.severity, Severity::Warning);
    }

    #[test]
    fn non_coercible_values_fail_type_conformance() {
        let mut config = config();
        config.schema = vec![ColumnSpec {
            name: "duration".into(),
            data_type: DataType::Int,
        }];

        let mut rows = vec![row(1, 5, 30)];
        rows.push(RowData::new(
            "visits",
            vec![
                FieldValue::new("id", Value::Int(2)),
                FieldValue::new(
                    "visit_date",
                    Value::Timestamp(Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap()),
                ),
                FieldValue::new("duration", Value::String("not a number".into())),
            ],
        ));

        let data = dataset(rows);
        let report = run_battery(&config, &data, &ReferenceSets::new());

        let conformance = report
            .results
            .iter()
            .find(|r| r.check == "type_conformance")
            .unwrap();
        assert!(!conformance.passed);
        assert_eq!(conformance.affected_rows, 1);
        assert_eq!(report.verdict, Verdict::Critical);
    }

    #[test]
    fn negative_values_warn() {
        let mut config = config();
        config.quality.non_negative_columns = vec!["duration".into()];

        let data = dataset(vec![row(1, 5, 30), row(2, 6, -15)]);
        let report = run_battery(&config, &data, &ReferenceSets::new());

        let sanity = report
            .results
            .iter()
            .find(|r| r.check == "value_range_sanity")
            .unwrap();
        assert!(!sanity.passed);
        assert_eq!(sanity.severity, Severity::Warning);
        assert_eq!(report.verdict, Verdict::Warning);
    }
}
