use crate::{
    error::ConnectorError,
    sink::{Destination, LoadAck, LoadSink},
};
use async_trait::async_trait;
use model::records::dataset::Dataset;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reference [`LoadSink`] writing one CSV file per destination under a base
/// directory. Existing files are overwritten, which keeps re-runs of an
/// uncommitted window idempotent.
pub struct CsvSink {
    base_dir: PathBuf,
}

impl CsvSink {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn output_path(&self, destination: &Destination) -> PathBuf {
        self.base_dir.join(format!("{}.csv", destination.name))
    }
}

#[async_trait]
impl LoadSink for CsvSink {
    async fn write(
        &self,
        dataset: &Dataset,
        destination: &Destination,
    ) -> Result<LoadAck, ConnectorError> {
        let path = self.output_path(destination);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| ConnectorError::Sink(e.to_string()))?;

        if let Some(first) = dataset.rows.first() {
            writer
                .write_record(first.column_names())
                .map_err(|e| ConnectorError::Sink(e.to_string()))?;
        }

        for row in &dataset.rows {
            let record: Vec<String> = row
                .field_values
                .iter()
                .map(|fv| {
                    fv.value
                        .as_ref()
                        .and_then(|v| v.as_string())
                        .unwrap_or_default()
                })
                .collect();
            writer
                .write_record(&record)
                .map_err(|e| ConnectorError::Sink(e.to_string()))?;
        }

        writer
            .flush()
            .map_err(|e| ConnectorError::Sink(e.to_string()))?;

        info!(
            source = %dataset.source,
            rows = dataset.row_count(),
            path = %path.display(),
            "Dataset written"
        );

        Ok(LoadAck {
            rows_written: dataset.row_count(),
            location: path.display().to_string(),
        })
    }
}
