use crate::error::ExtractError;
use crate::extract::classify::classify_connector_error;
use chrono::{Duration as ChronoDuration, Utc};
use connectors::executor::QueryExecutor;
use connectors::query::QueryParams;
use engine_config::settings::source::SourceConfig;
use engine_core::checkpoint::CheckpointStore;
use engine_core::retry::RetryError;
use model::core::identifiers::SourceId;
use model::extraction::{mode::ExtractionMode, window::ExtractionWindow};
use model::records::batch::ExtractionBatch;
use model::records::dataset::{Dataset, ExtractionMetadata};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of window resolution for one source-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowResolution {
    /// No date predicate; the whole table.
    Unbounded,
    Bounded(ExtractionWindow),
    /// The watermark has already reached now; nothing new to pull.
    UpToDate,
}

/// Pulls one source's rows for a resolved window, in fixed-size batches
/// with per-batch retry. Batches are concatenated in fetch order; a failed
/// batch is always re-issued whole.
pub struct ExtractionEngine {
    executor: Arc<dyn QueryExecutor>,
    store: Arc<dyn CheckpointStore>,
    default_batch_size: usize,
    default_lookback_days: Option<i64>,
}

impl ExtractionEngine {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        store: Arc<dyn CheckpointStore>,
        default_batch_size: usize,
        default_lookback_days: Option<i64>,
    ) -> Self {
        Self {
            executor,
            store,
            default_batch_size,
            default_lookback_days,
        }
    }

    /// Resolves the extraction window for a mode.
    pub async fn resolve_window(
        &self,
        config: &SourceConfig,
        mode: &ExtractionMode,
    ) -> Result<WindowResolution, ExtractError> {
        let now = Utc::now();

        match mode {
            ExtractionMode::Full => Ok(WindowResolution::Unbounded),
            ExtractionMode::Custom(window) => Ok(WindowResolution::Bounded(*window)),
            ExtractionMode::Incremental => {
                let source = SourceId::from(config.name.as_str());
                let checkpoint = self.store.get(&source).await?;
                let watermark = checkpoint.and_then(|c| c.last_extraction_watermark);

                let start = match watermark {
                    Some(watermark) => Some(watermark),
                    // First run: honor the configured lookback, otherwise
                    // pull everything.
                    None => self
                        .default_lookback_days
                        .map(|days| now - ChronoDuration::days(days)),
                };

                match start {
                    None => Ok(WindowResolution::Unbounded),
                    Some(start) => Ok(ExtractionWindow::new(start, now)
                        .map(WindowResolution::Bounded)
                        .unwrap_or(WindowResolution::UpToDate)),
                }
            }
        }
    }

    pub async fn extract(
        &self,
        config: &SourceConfig,
        mode: &ExtractionMode,
    ) -> Result<Dataset, ExtractError> {
        match self.resolve_window(config, mode).await? {
            WindowResolution::Unbounded => self.extract_window(config, None).await,
            WindowResolution::Bounded(window) => self.extract_window(config, Some(window)).await,
            WindowResolution::UpToDate => {
                info!(source = %config.name, "Watermark already current; nothing to extract");
                Ok(Dataset {
                    source: SourceId::from(config.name.as_str()),
                    window: None,
                    rows: Vec::new(),
                    metadata: ExtractionMetadata {
                        row_count: 0,
                        batch_count: 0,
                        retries: 0,
                        elapsed: std::time::Duration::ZERO,
                        extracted_at: Utc::now(),
                    },
                })
            }
        }
    }

    /// Runs the paginated pull over an already-resolved window.
    pub async fn extract_window(
        &self,
        config: &SourceConfig,
        window: Option<ExtractionWindow>,
    ) -> Result<Dataset, ExtractError> {
        let template = config.query_for(window.is_some());
        if window.is_none() && template.requires_window() {
            return Err(ExtractError::MissingFullQuery {
                source_name: config.name.clone(),
            });
        }

        let batch_size = config.effective_batch_size(self.default_batch_size);
        let retry = config.retry.to_policy();
        let started = Instant::now();

        let mut rows = Vec::new();
        let mut offset = 0;
        let mut batch_count = 0;
        let mut retries = 0;

        info!(
            source = %config.name,
            window = ?window,
            batch_size,
            "Starting extraction"
        );

        loop {
            let params = QueryParams {
                start_date: window.map(|w| w.start),
                end_date: window.map(|w| w.end),
                batch_size,
                batch_offset: offset,
            };
            let query = template.render(&params);

            let result = retry
                .run(
                    || {
                        let query = query.clone();
                        let params = params.clone();
                        let executor = Arc::clone(&self.executor);
                        async move { executor.execute(&query, &params).await }
                    },
                    classify_connector_error,
                )
                .await;

            let (mut batch_rows, batch_retries) = match result {
                Ok(ok) => ok,
                Err(RetryError::Fatal(error)) => {
                    return Err(ExtractError::Query {
                        source_name: config.name.clone(),
                        error,
                    });
                }
                Err(RetryError::AttemptsExceeded {
                    last_error,
                    attempts,
                }) => {
                    warn!(
                        source = %config.name,
                        offset,
                        attempts,
                        "Batch fetch exhausted retry budget"
                    );
                    return Err(ExtractError::ExtractionFailed {
                        source_name: config.name.clone(),
                        attempts,
                        last_error,
                    });
                }
            };

            retries += batch_retries;
            for row in &mut batch_rows {
                row.entity = config.name.clone();
            }
            let batch = ExtractionBatch::new(offset, batch_size, batch_rows);
            batch_count += 1;

            debug!(
                source = %config.name,
                offset,
                rows = batch.len(),
                retries = batch_retries,
                "Fetched batch"
            );

            let last = batch.is_last();
            offset += batch.len();
            rows.extend(batch.rows);

            if last {
                break;
            }
        }

        let metadata = ExtractionMetadata {
            row_count: rows.len(),
            batch_count,
            retries,
            elapsed: started.elapsed(),
            extracted_at: Utc::now(),
        };

        info!(
            source = %config.name,
            rows = metadata.row_count,
            batches = metadata.batch_count,
            retries = metadata.retries,
            "Extraction complete"
        );

        Ok(Dataset {
            source: SourceId::from(config.name.as_str()),
            window,
            rows,
            metadata,
        })
    }
}
