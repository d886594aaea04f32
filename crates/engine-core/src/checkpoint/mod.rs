pub mod json_store;
pub mod models;

use crate::error::CheckpointError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::core::identifiers::{RunId, SourceId};
use models::{CheckpointStatus, ExtractionCheckpoint};
use std::collections::BTreeMap;

/// Guard representing exclusive ownership of a source for the duration of a
/// run. Dropping the lease releases the lock.
pub trait SourceLease: Send {}

/// Durable per-source extraction state.
///
/// Implementations must make `commit` atomic: a crash mid-commit leaves
/// either the previous record or the new one, never a torn write.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Returns the record for a source, or `None` if it has never committed.
    async fn get(&self, source: &SourceId) -> Result<Option<ExtractionCheckpoint>, CheckpointError>;

    /// Advances the watermark after a fully successful run. Rejects any
    /// watermark earlier than the one already persisted.
    async fn commit(
        &self,
        source: &SourceId,
        watermark: DateTime<Utc>,
        run_id: &RunId,
    ) -> Result<(), CheckpointError>;

    /// Updates only the status field, preserving the last committed
    /// watermark. Used to mark a source in-progress or failed.
    async fn set_status(
        &self,
        source: &SourceId,
        status: CheckpointStatus,
        run_id: &RunId,
    ) -> Result<(), CheckpointError>;

    /// Acquires the per-source lock, preventing concurrent runs from
    /// processing the same source.
    async fn acquire_lock(
        &self,
        source: &SourceId,
        run_id: &RunId,
    ) -> Result<Box<dyn SourceLease>, CheckpointError>;

    /// Snapshot of every persisted record, for inspection commands.
    async fn all(&self) -> Result<BTreeMap<String, ExtractionCheckpoint>, CheckpointError>;
}
