use crate::{error::ConnectorError, query::QueryParams};
use async_trait::async_trait;
use model::records::row::RowData;

/// Query-execution capability consumed by the extraction engine.
///
/// Implementations wrap whatever client or pool actually talks to the
/// source; the engine only sees rendered query text plus the structured
/// batch parameters, and a transient-vs-permanent error taxonomy.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str, params: &QueryParams)
    -> Result<Vec<RowData>, ConnectorError>;
}
