#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use connectors::error::ConnectorError;
use connectors::executor::QueryExecutor;
use connectors::query::{QueryParams, QueryTemplate};
use connectors::sink::{Destination, LoadAck, LoadSink};
use engine_config::settings::quality::QualityConfig;
use engine_config::settings::source::{RetrySettings, SourceConfig};
use engine_config::settings::validated::ValidatedPlan;
use engine_core::checkpoint::models::{CheckpointStatus, ExtractionCheckpoint};
use engine_core::checkpoint::{CheckpointStore, SourceLease};
use engine_core::error::CheckpointError;
use model::core::identifiers::{RunId, SourceId};
use model::core::value::{FieldValue, Value};
use model::records::dataset::Dataset;
use model::records::row::RowData;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DATE_COLUMN: &str = "created_at";

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// One synthetic order row with the columns the test plans declare.
pub fn order_row(id: i64, customer_id: Option<i64>, created_at: DateTime<Utc>) -> RowData {
    let customer = match customer_id {
        Some(v) => FieldValue::new("customer_id", Value::Int(v)),
        None => FieldValue::null("customer_id", model::core::data_type::DataType::Int),
    };
    RowData::new(
        "",
        vec![
            FieldValue::new("id", Value::Int(id)),
            customer,
            FieldValue::new(DATE_COLUMN, Value::Timestamp(created_at)),
            FieldValue::new("amount", Value::Float(10.0 * id as f64)),
        ],
    )
}

pub fn windowed_query(table: &str) -> QueryTemplate {
    QueryTemplate::new(format!(
        "SELECT * FROM {table} WHERE {DATE_COLUMN} >= '{{start_date}}' \
         AND {DATE_COLUMN} < '{{end_date}}' ORDER BY id \
         LIMIT {{batch_size}} OFFSET {{batch_offset}}"
    ))
}

pub fn full_query(table: &str) -> QueryTemplate {
    QueryTemplate::new(format!(
        "SELECT * FROM {table} ORDER BY id LIMIT {{batch_size}} OFFSET {{batch_offset}}"
    ))
}

/// Retry knobs tuned so exhausting the budget takes milliseconds.
pub fn fast_retry(max_attempts: usize) -> RetrySettings {
    RetrySettings {
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 5,
    }
}

/// Incremental source over a windowed query, fast retries, default quality.
pub fn source_config(name: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        query: windowed_query(name),
        full_query: Some(full_query(name)),
        primary_key: vec!["id".to_string()],
        date_column: Some(DATE_COLUMN.to_string()),
        incremental: true,
        batch_size: None,
        retry: fast_retry(3),
        destination: None,
        schema: Vec::new(),
        quality: QualityConfig::default(),
    }
}

pub fn full_source_config(name: &str) -> SourceConfig {
    SourceConfig {
        incremental: false,
        date_column: None,
        query: full_query(name),
        full_query: None,
        ..source_config(name)
    }
}

pub fn plan_for(dir: &Path, sources: Vec<SourceConfig>) -> ValidatedPlan {
    ValidatedPlan {
        database_url: None,
        checkpoint_path: dir.join("checkpoints.json"),
        summaries_dir: dir.join("summaries"),
        output_dir: dir.join("output"),
        max_workers: 2,
        default_lookback_days: None,
        default_batch_size: 100,
        sources,
    }
}

/// In-memory source: named tables sliced by the structured batch params,
/// with the window predicate applied to the `created_at` column the same
/// way the rendered SQL would. Rejects query text with unsubstituted
/// placeholders the way a real database would, and keeps every received
/// query for assertions on the rendered SQL.
#[derive(Default)]
pub struct TableExecutor {
    tables: HashMap<String, Vec<RowData>>,
    queries: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl TableExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, rows: Vec<RowData>) -> Self {
        self.tables.insert(name.to_string(), rows);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn in_window(row: &RowData, params: &QueryParams) -> bool {
        if params.start_date.is_none() && params.end_date.is_none() {
            return true;
        }
        let Some(ts) = row.get_value(DATE_COLUMN).as_timestamp() else {
            return false;
        };
        params.start_date.is_none_or(|start| ts >= start)
            && params.end_date.is_none_or(|end| ts < end)
    }
}

#[async_trait]
impl QueryExecutor for TableExecutor {
    async fn execute(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<RowData>, ConnectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        if query.contains('{') {
            return Err(ConnectorError::MalformedQuery(format!(
                "unsubstituted placeholder in: {query}"
            )));
        }

        let rows = self
            .tables
            .iter()
            .find(|(name, _)| query.contains(&format!("FROM {name}")))
            .map(|(_, rows)| rows)
            .ok_or_else(|| ConnectorError::MalformedQuery(format!("no such table: {query}")))?;

        Ok(rows
            .iter()
            .filter(|row| Self::in_window(row, params))
            .skip(params.batch_offset)
            .take(params.batch_size)
            .cloned()
            .collect())
    }
}

/// Fails the first `failures` calls with a transient error, then delegates.
pub struct FlakyExecutor {
    inner: TableExecutor,
    remaining: AtomicUsize,
}

impl FlakyExecutor {
    pub fn new(inner: TableExecutor, failures: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl QueryExecutor for FlakyExecutor {
    async fn execute(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<RowData>, ConnectorError> {
        if self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ConnectorError::ConnectionDropped(
                "injected transient failure".into(),
            ));
        }
        self.inner.execute(query, params).await
    }
}

/// Always fails; `transient` picks the error taxonomy side.
pub struct AlwaysFailExecutor {
    transient: bool,
    pub calls: AtomicUsize,
}

impl AlwaysFailExecutor {
    pub fn new(transient: bool) -> Self {
        Self {
            transient,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for AlwaysFailExecutor {
    async fn execute(
        &self,
        _query: &str,
        _params: &QueryParams,
    ) -> Result<Vec<RowData>, ConnectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.transient {
            Err(ConnectorError::Timeout("injected timeout".into()))
        } else {
            Err(ConnectorError::MalformedQuery("injected syntax error".into()))
        }
    }
}

/// Sink that keeps the last dataset written per destination, mirroring the
/// overwrite semantics of the file sink.
#[derive(Default)]
pub struct MemorySink {
    written: Mutex<HashMap<String, Vec<RowData>>>,
    writes: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, destination: &str) -> Vec<RowData> {
        self.written
            .lock()
            .unwrap()
            .get(destination)
            .cloned()
            .unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoadSink for MemorySink {
    async fn write(
        &self,
        dataset: &Dataset,
        destination: &Destination,
    ) -> Result<LoadAck, ConnectorError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.written
            .lock()
            .unwrap()
            .insert(destination.name.clone(), dataset.rows.clone());
        Ok(LoadAck {
            rows_written: dataset.row_count(),
            location: format!("memory://{}", destination.name),
        })
    }
}

pub struct FailingSink;

#[async_trait]
impl LoadSink for FailingSink {
    async fn write(
        &self,
        _dataset: &Dataset,
        _destination: &Destination,
    ) -> Result<LoadAck, ConnectorError> {
        Err(ConnectorError::Sink("injected sink failure".into()))
    }
}

/// Store wrapper that refuses commits, for exercising the commit phase.
pub struct RefusingCommitStore {
    inner: Box<dyn CheckpointStore>,
}

impl RefusingCommitStore {
    pub fn new(inner: impl CheckpointStore + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

#[async_trait]
impl CheckpointStore for RefusingCommitStore {
    async fn get(
        &self,
        source: &SourceId,
    ) -> Result<Option<ExtractionCheckpoint>, CheckpointError> {
        self.inner.get(source).await
    }

    async fn commit(
        &self,
        _source: &SourceId,
        _watermark: DateTime<Utc>,
        _run_id: &RunId,
    ) -> Result<(), CheckpointError> {
        Err(CheckpointError::StoreUnavailable(
            "injected commit failure".into(),
        ))
    }

    async fn set_status(
        &self,
        source: &SourceId,
        status: CheckpointStatus,
        run_id: &RunId,
    ) -> Result<(), CheckpointError> {
        self.inner.set_status(source, status, run_id).await
    }

    async fn acquire_lock(
        &self,
        source: &SourceId,
        run_id: &RunId,
    ) -> Result<Box<dyn SourceLease>, CheckpointError> {
        self.inner.acquire_lock(source, run_id).await
    }

    async fn all(&self) -> Result<BTreeMap<String, ExtractionCheckpoint>, CheckpointError> {
        self.inner.all().await
    }
}
