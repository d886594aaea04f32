use crate::validation::{QualityCheck, ValidationContext};
use engine_config::report::finding::{Severity, ValidationResult};

/// Every value must coerce to its declared column type.
pub struct TypeConformance;

impl QualityCheck for TypeConformance {
    fn name(&self) -> &'static str {
        "type_conformance"
    }

    fn evaluate(&self, ctx: &ValidationContext) -> ValidationResult {
        if ctx.config.schema.is_empty() {
            return ValidationResult::pass(
                self.name(),
                Severity::Critical,
                "no declared schema",
            );
        }

        let mut failures = 0;
        let mut columns = Vec::new();

        for col in &ctx.config.schema {
            let bad = ctx
                .dataset
                .rows
                .iter()
                .filter_map(|row| row.get(&col.name))
                .filter_map(|field| field.value.as_ref())
                .filter(|value| !value.is_null())
                .filter(|value| value.coerce_to(&col.data_type).is_none())
                .count();

            if bad > 0 {
                failures += bad;
                columns.push(format!("{}: {bad} values not {}", col.name, col.data_type));
            }
        }

        if failures > 0 {
            ValidationResult::fail(self.name(), Severity::Critical, failures, columns.join("; "))
        } else {
            ValidationResult::pass(
                self.name(),
                Severity::Critical,
                "all values conform to declared types",
            )
        }
    }
}
