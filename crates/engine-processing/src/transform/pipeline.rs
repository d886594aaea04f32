use crate::transform::coerce::CoerceTypes;
use crate::transform::dedup::Deduplicate;
use crate::transform::enrich::EnrichMetadata;
use crate::transform::standardize::StandardizeColumns;
use crate::transform::Transform;
use engine_config::report::summary::TransformStats;
use engine_config::settings::source::SourceConfig;
use model::core::identifiers::RunId;
use model::records::dataset::Dataset;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct TransformPipeline {
    transforms: Vec<Arc<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn add_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// The standard stage order: dedup, coerce, standardize, enrich.
    pub fn standard(config: &SourceConfig, run_id: &RunId) -> Self {
        Self::new()
            .add_transform(Deduplicate::new(
                config.primary_key.clone(),
                config.date_column.clone(),
            ))
            .add_transform(CoerceTypes::new(config.schema.clone()))
            .add_transform(StandardizeColumns)
            .add_transform(EnrichMetadata::new(run_id.clone()))
    }

    pub fn apply(&self, dataset: Dataset) -> (Dataset, TransformStats) {
        let mut stats = TransformStats {
            rows_in: dataset.row_count(),
            ..TransformStats::default()
        };

        let dataset = self
            .transforms
            .iter()
            .fold(dataset, |acc, transform| transform.apply(acc, &mut stats));

        stats.rows_out = dataset.row_count();
        info!(
            source = %dataset.source,
            rows_in = stats.rows_in,
            rows_out = stats.rows_out,
            duplicates_dropped = stats.duplicates_dropped,
            coercion_failures = stats.coercion_failures,
            "Transform complete"
        );

        (dataset, stats)
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use model::core::identifiers::SourceId;
    use model::core::value::{FieldValue, Value};
    use model::records::dataset::ExtractionMetadata;
    use model::records::row::RowData;

    #[test]
    fn standard_pipeline_dedups_coerces_and_enriches() {
        let config: SourceConfig = serde_json::from_value(serde_json::json!({
            "name": "visits",
            "query": "SELECT * LIMIT {batch_size} OFFSET {batch_offset}",
            "primary_key": ["id"],
            "incremental": false,
            "schema": [
                { "name": "id", "data_type": "int" },
                { "name": "Visit Count", "data_type": "int" }
            ]
        }))
        .unwrap();

        let rows = vec![
            RowData::new(
                "visits",
                vec![
                    FieldValue::new("id", Value::Int(1)),
                    FieldValue::new("Visit Count", Value::String("3".into())),
                ],
            ),
            RowData::new(
                "visits",
                vec![
                    FieldValue::new("id", Value::Int(1)),
                    FieldValue::new("Visit Count", Value::String("4".into())),
                ],
            ),
        ];
        let dataset = Dataset {
            source: SourceId::from("visits"),
            window: None,
            metadata: ExtractionMetadata {
                row_count: rows.len(),
                batch_count: 1,
                retries: 0,
                elapsed: std::time::Duration::ZERO,
                extracted_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            },
            rows,
        };

        let pipeline = TransformPipeline::standard(&config, &RunId::from("run-1"));
        let (out, stats) = pipeline.apply(dataset);

        assert_eq!(stats.rows_in, 2);
        assert_eq!(stats.rows_out, 1);
        assert_eq!(stats.duplicates_dropped, 1);
        assert_eq!(stats.coercion_failures, 0);

        let row = &out.rows[0];
        assert_eq!(row.get_value("visit_count"), Value::Int(3));
        assert_eq!(row.get_value("run_id"), Value::String("run-1".into()));
        assert!(row.get("extracted_at").is_some());
    }
}
