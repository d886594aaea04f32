use thiserror::Error;

/// Errors raised while loading or validating an extraction plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Failed to read plan file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse plan: {0}")]
    Parse(#[from] serde_json::Error),

    /// The plan parsed but violates a structural rule.
    #[error("Invalid plan: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
