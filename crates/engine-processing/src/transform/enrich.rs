use crate::transform::Transform;
use engine_config::report::summary::TransformStats;
use model::core::identifiers::RunId;
use model::core::value::{FieldValue, Value};
use model::records::dataset::Dataset;

/// Appends extraction provenance to every row: when it was extracted, from
/// which source, and by which pipeline run.
pub struct EnrichMetadata {
    run_id: RunId,
}

impl EnrichMetadata {
    pub fn new(run_id: RunId) -> Self {
        Self { run_id }
    }
}

impl Transform for EnrichMetadata {
    fn apply(&self, mut dataset: Dataset, _stats: &mut TransformStats) -> Dataset {
        let extracted_at = dataset.metadata.extracted_at;
        let source = dataset.source.as_str().to_string();

        for row in &mut dataset.rows {
            row.push_field(FieldValue::new(
                "extracted_at",
                Value::Timestamp(extracted_at),
            ));
            row.push_field(FieldValue::new("source_id", Value::String(source.clone())));
            row.push_field(FieldValue::new(
                "run_id",
                Value::String(self.run_id.as_str().to_string()),
            ));
        }
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use model::core::identifiers::SourceId;
    use model::records::dataset::ExtractionMetadata;
    use model::records::row::RowData;

    #[test]
    fn appends_provenance_fields() {
        let dataset = Dataset {
            source: SourceId::from("visits"),
            window: None,
            rows: vec![RowData::new(
                "visits",
                vec![FieldValue::new("id", Value::Int(1))],
            )],
            metadata: ExtractionMetadata {
                row_count: 1,
                batch_count: 1,
                retries: 0,
                elapsed: std::time::Duration::ZERO,
                extracted_at: Utc::now(),
            },
        };

        let mut stats = TransformStats::default();
        let out = EnrichMetadata::new(RunId::from("run-7")).apply(dataset, &mut stats);

        let row = &out.rows[0];
        assert!(row.get("extracted_at").is_some());
        assert_eq!(row.get_value("source_id"), Value::String("visits".into()));
        assert_eq!(row.get_value("run_id"), Value::String("run-7".into()));
    }
}
