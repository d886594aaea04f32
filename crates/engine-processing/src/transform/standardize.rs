use crate::transform::Transform;
use engine_config::report::summary::TransformStats;
use model::records::dataset::Dataset;

/// Canonicalizes column names: lowercase, spaces to underscores.
pub struct StandardizeColumns;

fn canonical(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(' ', "_")
}

impl Transform for StandardizeColumns {
    fn apply(&self, mut dataset: Dataset, _stats: &mut TransformStats) -> Dataset {
        for row in &mut dataset.rows {
            for field in &mut row.field_values {
                let standardized = canonical(&field.name);
                if standardized != field.name {
                    field.name = standardized;
                }
            }
        }
        dataset
    }
}
