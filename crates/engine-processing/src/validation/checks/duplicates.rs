use crate::validation::{QualityCheck, ValidationContext};
use engine_config::report::finding::ValidationResult;
use model::core::value::Value;
use std::collections::HashMap;

/// Counts rows sharing a primary key beyond the first occurrence. Severity
/// is configurable; dedup runs downstream, so this is usually a warning.
pub struct DuplicatePrimaryKeys;

impl QualityCheck for DuplicatePrimaryKeys {
    fn name(&self) -> &'static str {
        "duplicate_primary_keys"
    }

    fn evaluate(&self, ctx: &ValidationContext) -> ValidationResult {
        let severity = ctx.config.quality.duplicate_severity;
        let mut seen: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut duplicates = 0;

        for row in &ctx.dataset.rows {
            let key = row.key_values(&ctx.config.primary_key);
            // Rows with a null key component cannot be grouped reliably.
            if key.iter().any(|v| v.is_null()) {
                continue;
            }
            let count = seen.entry(key).or_insert(0);
            *count += 1;
            if *count > 1 {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            ValidationResult::fail(
                self.name(),
                severity,
                duplicates,
                format!("{duplicates} rows share a primary key with an earlier row"),
            )
        } else {
            ValidationResult::pass(self.name(), severity, "primary keys are unique")
        }
    }
}
