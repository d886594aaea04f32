use crate::validation::{QualityCheck, ValidationContext};
use engine_config::report::finding::{Severity, ValidationResult};

pub struct RowCountFloor;

impl QualityCheck for RowCountFloor {
    fn name(&self) -> &'static str {
        "row_count_floor"
    }

    fn evaluate(&self, ctx: &ValidationContext) -> ValidationResult {
        let rows = ctx.dataset.row_count();
        let min = ctx.config.quality.min_rows;

        if rows < min {
            ValidationResult::fail(
                self.name(),
                Severity::Critical,
                rows,
                format!("extracted {rows} rows, minimum is {min}"),
            )
        } else {
            ValidationResult::pass(
                self.name(),
                Severity::Critical,
                format!("{rows} rows extracted"),
            )
        }
    }
}
