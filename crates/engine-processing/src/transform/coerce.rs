use crate::transform::Transform;
use engine_config::report::summary::TransformStats;
use engine_config::settings::source::ColumnSpec;
use model::records::dataset::Dataset;
use tracing::warn;

/// Coerces values to their declared column types. Unconvertible values
/// become nulls and bump the coercion-failure counter rather than failing
/// the run.
pub struct CoerceTypes {
    schema: Vec<ColumnSpec>,
}

impl CoerceTypes {
    pub fn new(schema: Vec<ColumnSpec>) -> Self {
        Self { schema }
    }
}

impl Transform for CoerceTypes {
    fn apply(&self, mut dataset: Dataset, stats: &mut TransformStats) -> Dataset {
        if self.schema.is_empty() {
            return dataset;
        }

        let mut failures = 0;

        for row in &mut dataset.rows {
            for field in &mut row.field_values {
                let Some(spec) = self
                    .schema
                    .iter()
                    .find(|col| col.name.eq_ignore_ascii_case(&field.name))
                else {
                    continue;
                };

                let Some(value) = field.value.as_ref() else {
                    field.data_type = spec.data_type.clone();
                    continue;
                };
                if value.is_null() {
                    field.data_type = spec.data_type.clone();
                    continue;
                }

                match value.coerce_to(&spec.data_type) {
                    Some(coerced) => {
                        field.value = Some(coerced);
                        field.data_type = spec.data_type.clone();
                    }
                    None => {
                        failures += 1;
                        field.value = None;
                        field.data_type = spec.data_type.clone();
                    }
                }
            }
        }

        if failures > 0 {
            warn!(
                source = %dataset.source,
                failures,
                "Coercion nulled unconvertible values"
            );
        }
        stats.coercion_failures += failures;
        dataset
    }
}
