use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The backing medium cannot be read or written at all.
    #[error("Checkpoint store unavailable: {0}")]
    StoreUnavailable(String),

    /// A persisted record failed to parse. Fatal for the affected source;
    /// silently resetting would risk re-extracting or skipping data.
    #[error("Checkpoint record for source '{source_name}' is corrupt: {detail}")]
    Corrupt { source_name: String, detail: String },

    /// Another run currently holds the per-source lock.
    #[error("Source '{source_name}' is locked by run '{holder}'")]
    LockHeld { source_name: String, holder: String },

    /// A commit attempted to move the watermark backwards.
    #[error("Watermark regression for source '{source_name}': {existing} -> {proposed}")]
    WatermarkRegression {
        source_name: String,
        existing: String,
        proposed: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
