use crate::transform::Transform;
use chrono::{DateTime, Utc};
use engine_config::report::summary::TransformStats;
use model::core::value::Value;
use model::records::dataset::Dataset;
use model::records::row::RowData;
use std::collections::{HashMap, HashSet};

/// Drops rows sharing a primary key, keeping the one with the latest
/// modification timestamp; equal timestamps keep the first-seen row. Rows
/// with a null key component are never grouped.
pub struct Deduplicate {
    primary_key: Vec<String>,
    timestamp_column: Option<String>,
}

impl Deduplicate {
    pub fn new(primary_key: Vec<String>, timestamp_column: Option<String>) -> Self {
        Self {
            primary_key,
            timestamp_column,
        }
    }

    fn timestamp_of(&self, row: &RowData) -> DateTime<Utc> {
        self.timestamp_column
            .as_deref()
            .and_then(|column| row.get_value(column).as_timestamp())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Transform for Deduplicate {
    fn apply(&self, mut dataset: Dataset, stats: &mut TransformStats) -> Dataset {
        if self.primary_key.is_empty() || dataset.rows.len() < 2 {
            return dataset;
        }

        // Index of the winning row per key.
        let mut winners: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut ungrouped: HashSet<usize> = HashSet::new();

        for (idx, row) in dataset.rows.iter().enumerate() {
            let key = row.key_values(&self.primary_key);
            if key.iter().any(Value::is_null) {
                ungrouped.insert(idx);
                continue;
            }

            match winners.get(&key) {
                None => {
                    winners.insert(key, idx);
                }
                Some(&current) => {
                    if self.timestamp_of(row) > self.timestamp_of(&dataset.rows[current]) {
                        winners.insert(key, idx);
                    }
                }
            }
        }

        let keep: HashSet<usize> = winners.values().copied().chain(ungrouped).collect();
        let before = dataset.rows.len();

        let mut idx = 0;
        dataset.rows.retain(|_| {
            let kept = keep.contains(&idx);
            idx += 1;
            kept
        });

        stats.duplicates_dropped += before - dataset.rows.len();
        dataset
    }
}
