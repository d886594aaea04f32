use crate::validation::{QualityCheck, ValidationContext};
use engine_config::report::finding::{Severity, ValidationResult};

/// Sanity check for numeric columns expected to be non-negative, e.g.
/// durations or quantities.
pub struct ValueRangeSanity;

impl QualityCheck for ValueRangeSanity {
    fn name(&self) -> &'static str {
        "value_range_sanity"
    }

    fn evaluate(&self, ctx: &ValidationContext) -> ValidationResult {
        let columns = &ctx.config.quality.non_negative_columns;
        if columns.is_empty() {
            return ValidationResult::pass(
                self.name(),
                Severity::Warning,
                "no numeric range rules configured",
            );
        }

        let mut negatives = 0;
        let mut details = Vec::new();

        for column in columns {
            let bad = ctx
                .dataset
                .rows
                .iter()
                .filter_map(|row| row.get(column))
                .filter_map(|field| field.value.as_ref())
                .filter_map(|value| value.as_f64())
                .filter(|n| *n < 0.0)
                .count();

            if bad > 0 {
                negatives += bad;
                details.push(format!("{column}: {bad} negative values"));
            }
        }

        if negatives > 0 {
            ValidationResult::fail(self.name(), Severity::Warning, negatives, details.join("; "))
        } else {
            ValidationResult::pass(self.name(), Severity::Warning, "numeric ranges look sane")
        }
    }
}
