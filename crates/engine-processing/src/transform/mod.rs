pub mod coerce;
pub mod dedup;
pub mod enrich;
pub mod pipeline;
pub mod standardize;

use engine_config::report::summary::TransformStats;
use model::records::dataset::Dataset;

pub trait Transform: Send + Sync {
    fn apply(&self, dataset: Dataset, stats: &mut TransformStats) -> Dataset;
}
