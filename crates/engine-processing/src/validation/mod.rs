pub mod checks;
pub mod engine;

use chrono::{DateTime, Utc};
use engine_config::report::finding::ValidationResult;
use engine_config::settings::source::SourceConfig;
use model::core::value::Value;
use model::records::dataset::Dataset;
use std::collections::{HashMap, HashSet};

/// Primary-key value sets collected from reference sources, keyed by
/// `(source name, column name)`.
pub type ReferenceSets = HashMap<(String, String), HashSet<Value>>;

/// Everything a quality check may look at. Checks are side-effect-free.
pub struct ValidationContext<'a> {
    pub dataset: &'a Dataset,
    pub config: &'a SourceConfig,
    pub reference_sets: &'a ReferenceSets,
    pub now: DateTime<Utc>,
}

pub trait QualityCheck: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &ValidationContext) -> ValidationResult;
}
