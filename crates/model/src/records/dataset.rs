use crate::{
    core::identifiers::SourceId,
    extraction::window::ExtractionWindow,
    records::row::RowData,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A materialized row set for one source-run, in source query order.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: SourceId,
    pub window: Option<ExtractionWindow>,
    pub rows: Vec<RowData>,
    pub metadata: ExtractionMetadata,
}

impl Dataset {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub row_count: usize,
    pub batch_count: usize,
    pub retries: usize,
    pub elapsed: Duration,
    pub extracted_at: DateTime<Utc>,
}
