use connectors::error::ConnectorError;
use engine_core::error::CheckpointError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Transient failures exhausted the retry budget for a batch.
    #[error("Extraction failed for source '{source_name}' after {attempts} attempts: {last_error}")]
    ExtractionFailed {
        source_name: String,
        attempts: usize,
        last_error: ConnectorError,
    },

    /// Permanent query failure, aborted without retrying.
    #[error("Query for source '{source_name}' failed: {error}")]
    Query {
        source_name: String,
        #[source]
        error: ConnectorError,
    },

    /// An unbounded pull was requested but every configured query for the
    /// source needs window bounds.
    #[error("Source '{source_name}' has no query usable without a window")]
    MissingFullQuery { source_name: String },

    /// Window resolution could not read the checkpoint.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
