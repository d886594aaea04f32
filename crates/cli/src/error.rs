use connectors::error::ConnectorError;
use engine_config::error::PlanError;
use engine_core::error::CheckpointError;
use engine_runtime::error::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load plan: {0}")]
    Plan(#[from] PlanError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Checkpoint store error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
