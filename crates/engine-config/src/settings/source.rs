use crate::settings::quality::QualityConfig;
use connectors::query::QueryTemplate;
use engine_core::retry::RetryPolicy;
use model::core::data_type::DataType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Declared shape of one extracted column, used for type conformance
/// checks and downstream coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: DataType,
}

/// Retry knobs for batch fetches, resolved into a `RetryPolicy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Per-source extraction configuration. Immutable once the plan is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Parameterized query text; placeholders are substituted per batch.
    pub query: QueryTemplate,
    /// Variant without window placeholders, used for unbounded pulls.
    /// Required whenever `query` references the extraction window.
    #[serde(default)]
    pub full_query: Option<QueryTemplate>,
    pub primary_key: Vec<String>,
    /// Column driving incremental window filtering. Required when
    /// `incremental` is set.
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default = "default_incremental")]
    pub incremental: bool,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub retry: RetrySettings,
    /// Destination name passed to the load sink. Defaults to the source
    /// name when omitted.
    #[serde(default)]
    pub destination: Option<String>,
    /// Declared column types; empty means no conformance or coercion.
    #[serde(default)]
    pub schema: Vec<ColumnSpec>,
    #[serde(default)]
    pub quality: QualityConfig,
}

fn default_incremental() -> bool {
    true
}

impl SourceConfig {
    pub fn effective_batch_size(&self, plan_default: usize) -> usize {
        self.batch_size.unwrap_or(plan_default)
    }

    pub fn destination_name(&self) -> &str {
        self.destination.as_deref().unwrap_or(&self.name)
    }

    /// Template for a pull with or without window bounds. Unbounded pulls
    /// use the dedicated full query when one is configured.
    pub fn query_for(&self, windowed: bool) -> &QueryTemplate {
        if windowed {
            &self.query
        } else {
            self.full_query.as_ref().unwrap_or(&self.query)
        }
    }
}
