use crate::records::row::RowData;

/// A bounded page of rows fetched (and retried) as a unit.
#[derive(Debug, Clone)]
pub struct ExtractionBatch {
    pub offset: usize,
    pub limit: usize,
    pub rows: Vec<RowData>,
}

impl ExtractionBatch {
    pub fn new(offset: usize, limit: usize, rows: Vec<RowData>) -> Self {
        Self { offset, limit, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A batch shorter than its limit signals source exhaustion.
    pub fn is_last(&self) -> bool {
        self.rows.len() < self.limit
    }
}
