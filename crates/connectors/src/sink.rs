use crate::error::ConnectorError;
use async_trait::async_trait;
use model::records::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// Where a transformed dataset should land. Interpreted by the sink
/// implementation (a file stem for file sinks, a table for database sinks).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destination {
    pub name: String,
}

impl Destination {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAck {
    pub rows_written: usize,
    pub location: String,
}

/// Load capability consumed by the orchestrator after transformation.
/// Sinks are expected to be idempotent per destination: re-running an
/// uncommitted window overwrites rather than appends.
#[async_trait]
pub trait LoadSink: Send + Sync {
    async fn write(
        &self,
        dataset: &Dataset,
        destination: &Destination,
    ) -> Result<LoadAck, ConnectorError>;
}
