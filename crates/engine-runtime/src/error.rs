use engine_config::error::PlanError;
use thiserror::Error;

/// Errors that abort a whole invocation. Per-source failures never surface
/// here; they are isolated into the source's run summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Plan(#[from] PlanError),
}
