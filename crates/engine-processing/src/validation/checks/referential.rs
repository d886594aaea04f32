use crate::validation::{QualityCheck, ValidationContext};
use engine_config::report::finding::{Severity, ValidationResult};

/// Foreign-key values must exist in the reference sets collected from the
/// sources named by the plan's relationships.
pub struct ReferentialIntegrity;

impl QualityCheck for ReferentialIntegrity {
    fn name(&self) -> &'static str {
        "referential_integrity"
    }

    fn evaluate(&self, ctx: &ValidationContext) -> ValidationResult {
        let quality = &ctx.config.quality;
        if quality.relationships.is_empty() {
            return ValidationResult::pass(
                self.name(),
                Severity::Critical,
                "no relationships configured",
            );
        }

        let mut total_orphans = 0;
        let mut critical = Vec::new();
        let mut unavailable = Vec::new();

        for rel in &quality.relationships {
            let key = (rel.references_source.clone(), rel.references_column.clone());
            let Some(reference) = ctx.reference_sets.get(&key) else {
                unavailable.push(format!(
                    "{} -> {}.{} (reference set not extracted this run)",
                    rel.column, rel.references_source, rel.references_column
                ));
                continue;
            };

            let mut orphans = 0;
            let mut checked = 0;
            for row in &ctx.dataset.rows {
                let value = row.get_value(&rel.column);
                if value.is_null() {
                    continue;
                }
                checked += 1;
                if !reference.contains(&value) {
                    orphans += 1;
                }
            }

            if checked > 0 {
                let fraction = orphans as f64 / checked as f64;
                if fraction > quality.max_orphan_fraction {
                    total_orphans += orphans;
                    critical.push(format!(
                        "{}: {orphans}/{checked} values missing from {}.{}",
                        rel.column, rel.references_source, rel.references_column
                    ));
                }
            }
        }

        if !critical.is_empty() {
            ValidationResult::fail(
                self.name(),
                Severity::Critical,
                total_orphans,
                critical.join("; "),
            )
        } else if !unavailable.is_empty() {
            ValidationResult::fail(self.name(), Severity::Warning, 0, unavailable.join("; "))
        } else {
            ValidationResult::pass(
                self.name(),
                Severity::Critical,
                format!("{} relationships satisfied", quality.relationships.len()),
            )
        }
    }
}
