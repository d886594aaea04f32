use crate::validation::{QualityCheck, ValidationContext};
use engine_config::report::finding::{Severity, ValidationResult};

pub struct NullRate;

impl QualityCheck for NullRate {
    fn name(&self) -> &'static str {
        "null_rate"
    }

    fn evaluate(&self, ctx: &ValidationContext) -> ValidationResult {
        let quality = &ctx.config.quality;
        if quality.critical_columns.is_empty() {
            return ValidationResult::pass(
                self.name(),
                Severity::Critical,
                "no critical columns configured",
            );
        }

        let total = ctx.dataset.row_count();
        if total == 0 {
            return ValidationResult::pass(self.name(), Severity::Critical, "no rows to inspect");
        }

        let mut violations = Vec::new();
        let mut affected = 0;

        for column in &quality.critical_columns {
            let nulls = ctx
                .dataset
                .rows
                .iter()
                .filter(|row| row.get(column).is_none_or(|f| f.is_null()))
                .count();
            let fraction = nulls as f64 / total as f64;

            if fraction > quality.max_null_fraction {
                affected += nulls;
                violations.push(format!("{column}: {:.2}% null", fraction * 100.0));
            }
        }

        if violations.is_empty() {
            ValidationResult::pass(
                self.name(),
                Severity::Critical,
                format!(
                    "{} critical columns within {:.2}% null threshold",
                    quality.critical_columns.len(),
                    quality.max_null_fraction * 100.0
                ),
            )
        } else {
            ValidationResult::fail(
                self.name(),
                Severity::Critical,
                affected,
                violations.join("; "),
            )
        }
    }
}
