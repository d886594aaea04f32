use crate::validation::{QualityCheck, ValidationContext};
use chrono::{DateTime, Utc};
use engine_config::report::finding::{Severity, ValidationResult};
use model::core::value::Value;

/// Every temporal value must lie within the extraction window (inclusive),
/// or within the configured absolute bounds when the run is unwindowed.
/// Violations in the incremental date column are critical; other temporal
/// columns only warn.
pub struct DateRangePlausibility;

impl DateRangePlausibility {
    fn count_violations(
        ctx: &ValidationContext,
        column: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> usize {
        ctx.dataset
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter_map(|field| field.value.as_ref())
            .filter(|value| !matches!(value, Value::Null))
            .filter(|value| match value.as_timestamp() {
                Some(ts) => ts < start || ts > end,
                // A temporal column holding something that is not a date at
                // all; type conformance reports it, range treats it as
                // implausible too.
                None => true,
            })
            .count()
    }
}

impl QualityCheck for DateRangePlausibility {
    fn name(&self) -> &'static str {
        "date_range_plausibility"
    }

    fn evaluate(&self, ctx: &ValidationContext) -> ValidationResult {
        let bounds = match ctx.dataset.window {
            Some(window) => Some((window.start, window.end)),
            None => ctx
                .config
                .quality
                .absolute_date_bounds
                .as_ref()
                .map(|b| b.resolve(ctx.now)),
        };

        let Some((start, end)) = bounds else {
            return ValidationResult::pass(
                self.name(),
                Severity::Critical,
                "no window or absolute bounds to check against",
            );
        };

        let primary_violations = ctx
            .config
            .date_column
            .as_deref()
            .map(|column| Self::count_violations(ctx, column, start, end))
            .unwrap_or(0);

        let secondary_violations: usize = ctx
            .config
            .schema
            .iter()
            .filter(|col| col.data_type.is_temporal())
            .filter(|col| Some(col.name.as_str()) != ctx.config.date_column.as_deref())
            .map(|col| Self::count_violations(ctx, &col.name, start, end))
            .sum();

        if primary_violations > 0 {
            ValidationResult::fail(
                self.name(),
                Severity::Critical,
                primary_violations,
                format!(
                    "{primary_violations} values outside [{}, {}]",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                ),
            )
        } else if secondary_violations > 0 {
            ValidationResult::fail(
                self.name(),
                Severity::Warning,
                secondary_violations,
                format!("{secondary_violations} values in secondary temporal columns out of range"),
            )
        } else {
            ValidationResult::pass(self.name(), Severity::Critical, "all temporal values in range")
        }
    }
}
