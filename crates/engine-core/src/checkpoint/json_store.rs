use crate::checkpoint::models::{CheckpointStatus, ExtractionCheckpoint};
use crate::checkpoint::{CheckpointStore, SourceLease};
use crate::error::CheckpointError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::core::identifiers::{RunId, SourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_STALE_LOCK: Duration = Duration::from_secs(30 * 60);

/// Checkpoint store backed by a single human-readable JSON file, keyed by
/// source name. Commits go through a temp file and an atomic rename so a
/// crash never leaves a half-written store.
pub struct JsonCheckpointStore {
    path: PathBuf,
    locks_dir: PathBuf,
    stale_lock_after: Duration,
    // Serializes read-modify-write cycles within this process.
    write_guard: Mutex<()>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockRecord {
    run_id: String,
    acquired_at: DateTime<Utc>,
}

struct FileLease {
    path: PathBuf,
}

impl SourceLease for FileLease {}

impl Drop for FileLease {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                warn!("Failed to release lock file {:?}: {}", self.path, err);
            }
        }
    }
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let path = path.into();

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent)?;

        let locks_dir = parent.join("locks");
        fs::create_dir_all(&locks_dir)?;

        Ok(Self {
            path,
            locks_dir,
            stale_lock_after: DEFAULT_STALE_LOCK,
            write_guard: Mutex::new(()),
        })
    }

    pub fn with_stale_lock_after(mut self, after: Duration) -> Self {
        self.stale_lock_after = after;
        self
    }

    /// Loads the raw document without interpreting individual records, so
    /// one corrupt record does not block access to the others.
    fn load_raw(&self) -> Result<BTreeMap<String, serde_json::Value>, CheckpointError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(CheckpointError::StoreUnavailable(format!(
                    "{:?}: {err}",
                    self.path
                )));
            }
        };

        serde_json::from_str(&text).map_err(|err| {
            CheckpointError::StoreUnavailable(format!("{:?}: invalid document: {err}", self.path))
        })
    }

    fn decode_record(
        source: &str,
        raw: &serde_json::Value,
    ) -> Result<ExtractionCheckpoint, CheckpointError> {
        serde_json::from_value(raw.clone()).map_err(|err| CheckpointError::Corrupt {
            source_name: source.to_string(),
            detail: err.to_string(),
        })
    }

    fn write_atomic(
        &self,
        records: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), CheckpointError> {
        let text = serde_json::to_string_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn lock_path(&self, source: &SourceId) -> PathBuf {
        self.locks_dir.join(format!("{}.lock", source.as_str()))
    }

    fn try_create_lock(&self, path: &Path, record: &LockRecord) -> Result<bool, CheckpointError> {
        let text = serde_json::to_string_pretty(record)?;
        match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => {
                use std::io::Write;
                let mut file = file;
                file.write_all(text.as_bytes())?;
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl CheckpointStore for JsonCheckpointStore {
    async fn get(
        &self,
        source: &SourceId,
    ) -> Result<Option<ExtractionCheckpoint>, CheckpointError> {
        let records = self.load_raw()?;
        match records.get(source.as_str()) {
            Some(raw) => Ok(Some(Self::decode_record(source.as_str(), raw)?)),
            None => Ok(None),
        }
    }

    async fn commit(
        &self,
        source: &SourceId,
        watermark: DateTime<Utc>,
        run_id: &RunId,
    ) -> Result<(), CheckpointError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| CheckpointError::StoreUnavailable("write guard poisoned".into()))?;

        let mut records = self.load_raw()?;

        if let Some(raw) = records.get(source.as_str()) {
            let existing = Self::decode_record(source.as_str(), raw)?;
            if let Some(current) = existing.last_extraction_watermark {
                if watermark < current {
                    return Err(CheckpointError::WatermarkRegression {
                        source_name: source.as_str().to_string(),
                        existing: current.to_rfc3339(),
                        proposed: watermark.to_rfc3339(),
                    });
                }
            }
        }

        let record = ExtractionCheckpoint {
            last_extraction_watermark: Some(watermark),
            last_run_id: run_id.as_str().to_string(),
            status: CheckpointStatus::Clean,
        };
        records.insert(source.as_str().to_string(), serde_json::to_value(&record)?);
        self.write_atomic(&records)?;

        info!(
            "Committed checkpoint for source '{}' at {}",
            source,
            watermark.to_rfc3339()
        );
        Ok(())
    }

    async fn set_status(
        &self,
        source: &SourceId,
        status: CheckpointStatus,
        run_id: &RunId,
    ) -> Result<(), CheckpointError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| CheckpointError::StoreUnavailable("write guard poisoned".into()))?;

        let mut records = self.load_raw()?;

        let mut record = match records.get(source.as_str()) {
            Some(raw) => Self::decode_record(source.as_str(), raw)?,
            None => ExtractionCheckpoint {
                last_extraction_watermark: None,
                last_run_id: run_id.as_str().to_string(),
                status,
            },
        };
        record.status = status;
        record.last_run_id = run_id.as_str().to_string();

        records.insert(source.as_str().to_string(), serde_json::to_value(&record)?);
        self.write_atomic(&records)?;

        debug!("Source '{}' marked {}", source, status);
        Ok(())
    }

    async fn acquire_lock(
        &self,
        source: &SourceId,
        run_id: &RunId,
    ) -> Result<Box<dyn SourceLease>, CheckpointError> {
        let path = self.lock_path(source);
        let record = LockRecord {
            run_id: run_id.as_str().to_string(),
            acquired_at: Utc::now(),
        };

        if self.try_create_lock(&path, &record)? {
            return Ok(Box::new(FileLease { path }));
        }

        // The lock exists. If the holder looks dead (file older than the
        // stale threshold), steal it; otherwise report the holder.
        let existing: LockRecord = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or(LockRecord {
                run_id: "unknown".to_string(),
                acquired_at: Utc::now(),
            });

        let age = Utc::now().signed_duration_since(existing.acquired_at);
        let stale = age.to_std().map(|a| a >= self.stale_lock_after).unwrap_or(false);

        if stale {
            warn!(
                "Stealing stale lock for source '{}' held by run '{}'",
                source, existing.run_id
            );
            if let Err(err) = fs::remove_file(&path) {
                if err.kind() != ErrorKind::NotFound {
                    return Err(err.into());
                }
            }
            if self.try_create_lock(&path, &record)? {
                return Ok(Box::new(FileLease { path }));
            }
        }

        Err(CheckpointError::LockHeld {
            source_name: source.as_str().to_string(),
            holder: existing.run_id,
        })
    }

    async fn all(&self) -> Result<BTreeMap<String, ExtractionCheckpoint>, CheckpointError> {
        let records = self.load_raw()?;
        let mut out = BTreeMap::new();

        for (source, raw) in &records {
            out.insert(source.clone(), Self::decode_record(source, raw)?);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn store(dir: &tempfile::TempDir) -> JsonCheckpointStore {
        JsonCheckpointStore::new(dir.path().join("checkpoints.json")).unwrap()
    }

    #[tokio::test]
    async fn commit_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        let source = SourceId::from("orders");
        let run = RunId::from("run-1");

        store.commit(&source, ts(2025, 3, 1), &run).await.unwrap();

        let record = store.get(&source).await.unwrap().unwrap();
        assert_eq!(record.last_extraction_watermark, Some(ts(2025, 3, 1)));
        assert_eq!(record.last_run_id, "run-1");
        assert_eq!(record.status, CheckpointStatus::Clean);
    }

    #[tokio::test]
    async fn unknown_source_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        let record = store.get(&SourceId::from("missing")).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn rejects_watermark_regression() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        let source = SourceId::from("orders");

        store
            .commit(&source, ts(2025, 3, 10), &RunId::from("run-1"))
            .await
            .unwrap();

        let result = store
            .commit(&source, ts(2025, 3, 5), &RunId::from("run-2"))
            .await;

        assert!(matches!(
            result,
            Err(CheckpointError::WatermarkRegression { .. })
        ));

        // Original watermark survives the rejected commit.
        let record = store.get(&source).await.unwrap().unwrap();
        assert_eq!(record.last_extraction_watermark, Some(ts(2025, 3, 10)));
    }

    #[tokio::test]
    async fn set_status_preserves_committed_watermark() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        let source = SourceId::from("orders");

        store
            .commit(&source, ts(2025, 3, 10), &RunId::from("run-1"))
            .await
            .unwrap();
        store
            .set_status(&source, CheckpointStatus::Failed, &RunId::from("run-2"))
            .await
            .unwrap();

        let record = store.get(&source).await.unwrap().unwrap();
        assert_eq!(record.last_extraction_watermark, Some(ts(2025, 3, 10)));
        assert_eq!(record.status, CheckpointStatus::Failed);
        assert_eq!(record.last_run_id, "run-2");
    }

    #[tokio::test]
    async fn second_lock_on_same_source_is_rejected() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        let source = SourceId::from("orders");

        let _lease = store
            .acquire_lock(&source, &RunId::from("run-1"))
            .await
            .unwrap();

        let result = store.acquire_lock(&source, &RunId::from("run-2")).await;
        match result {
            Err(CheckpointError::LockHeld { holder, .. }) => assert_eq!(holder, "run-1"),
            Err(other) => panic!("expected lock held, got {other:?}"),
            Ok(_) => panic!("expected lock held, got a lease"),
        }
    }

    #[tokio::test]
    async fn dropping_lease_releases_lock() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        let source = SourceId::from("orders");

        {
            let _lease = store
                .acquire_lock(&source, &RunId::from("run-1"))
                .await
                .unwrap();
        }

        let lease = store.acquire_lock(&source, &RunId::from("run-2")).await;
        assert!(lease.is_ok());
    }

    #[tokio::test]
    async fn stale_lock_is_stolen() {
        let dir = tempdir().unwrap();
        let store = store(&dir).with_stale_lock_after(Duration::ZERO);
        let source = SourceId::from("orders");

        let lock_path = dir.path().join("locks/orders.lock");
        let dead = LockRecord {
            run_id: "run-dead".to_string(),
            acquired_at: ts(2020, 1, 1),
        };
        fs::write(&lock_path, serde_json::to_string(&dead).unwrap()).unwrap();

        let lease = store.acquire_lock(&source, &RunId::from("run-2")).await;
        assert!(lease.is_ok());
    }

    #[tokio::test]
    async fn corrupt_record_fails_only_affected_source() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        store
            .commit(&SourceId::from("orders"), ts(2025, 3, 1), &RunId::from("run-1"))
            .await
            .unwrap();

        // Damage one record in place.
        let path = dir.path().join("checkpoints.json");
        let mut doc: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        doc.insert(
            "customers".to_string(),
            serde_json::json!({"last_extraction_watermark": "not-a-date"}),
        );
        fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let healthy = store.get(&SourceId::from("orders")).await.unwrap();
        assert!(healthy.is_some());

        let corrupt = store.get(&SourceId::from("customers")).await;
        assert!(matches!(corrupt, Err(CheckpointError::Corrupt { .. })));
    }
}
