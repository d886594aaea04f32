use crate::error::PlanError;
use crate::plan::ExtractionPlan;
use crate::settings::source::SourceConfig;
use std::collections::HashSet;
use std::path::PathBuf;

/// Plan with every structural rule checked, resolved once at load time.
/// Runs only ever see this type.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub database_url: Option<String>,
    pub checkpoint_path: PathBuf,
    pub summaries_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_workers: usize,
    pub default_lookback_days: Option<i64>,
    pub default_batch_size: usize,
    pub sources: Vec<SourceConfig>,
}

impl ValidatedPlan {
    pub fn from_plan(plan: ExtractionPlan) -> Result<Self, PlanError> {
        if plan.sources.is_empty() {
            return Err(PlanError::Invalid("plan defines no sources".into()));
        }
        if plan.max_workers == 0 {
            return Err(PlanError::Invalid("max_workers must be at least 1".into()));
        }
        if plan.batch_size == 0 {
            return Err(PlanError::Invalid("batch_size must be positive".into()));
        }

        let mut names = HashSet::new();
        for source in &plan.sources {
            if !names.insert(source.name.as_str()) {
                return Err(PlanError::Invalid(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            Self::check_source(source)?;
        }

        for source in &plan.sources {
            for rel in &source.quality.relationships {
                if !names.contains(rel.references_source.as_str()) {
                    return Err(PlanError::Invalid(format!(
                        "source '{}' references unknown source '{}'",
                        source.name, rel.references_source
                    )));
                }
                if rel.references_source == source.name {
                    return Err(PlanError::Invalid(format!(
                        "source '{}' references itself",
                        source.name
                    )));
                }
            }
        }

        Ok(Self {
            database_url: plan.database_url,
            checkpoint_path: plan.checkpoint_path,
            summaries_dir: plan.summaries_dir,
            output_dir: plan.output_dir,
            max_workers: plan.max_workers,
            default_lookback_days: plan.default_lookback_days,
            default_batch_size: plan.batch_size,
            sources: plan.sources,
        })
    }

    fn check_source(source: &SourceConfig) -> Result<(), PlanError> {
        if source.primary_key.is_empty() {
            return Err(PlanError::Invalid(format!(
                "source '{}' has an empty primary key",
                source.name
            )));
        }
        if source.batch_size == Some(0) {
            return Err(PlanError::Invalid(format!(
                "source '{}' has a zero batch size",
                source.name
            )));
        }
        if source.retry.max_attempts == 0 {
            return Err(PlanError::Invalid(format!(
                "source '{}' allows zero attempts",
                source.name
            )));
        }
        if source.incremental {
            if source.date_column.is_none() {
                return Err(PlanError::Invalid(format!(
                    "incremental source '{}' has no date column",
                    source.name
                )));
            }
            if !source.query.requires_window() {
                return Err(PlanError::Invalid(format!(
                    "incremental source '{}' has a query without window placeholders",
                    source.name
                )));
            }
        }

        // Every source can be pulled unbounded (a full run, or a first
        // incremental run without a lookback), so a windowed query needs a
        // full variant that renders without window bounds.
        if source.query.requires_window() {
            match &source.full_query {
                None => {
                    return Err(PlanError::Invalid(format!(
                        "source '{}' has a windowed query but no full_query for unbounded runs",
                        source.name
                    )));
                }
                Some(full) if full.requires_window() => {
                    return Err(PlanError::Invalid(format!(
                        "source '{}' full_query must not use window placeholders",
                        source.name
                    )));
                }
                Some(_) => {}
            }
        }

        let quality = &source.quality;
        for (label, fraction) in [
            ("max_null_fraction", quality.max_null_fraction),
            ("max_orphan_fraction", quality.max_orphan_fraction),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(PlanError::Invalid(format!(
                    "source '{}': {label} must lie in [0, 1]",
                    source.name
                )));
            }
        }
        if let Some(bounds) = &quality.absolute_date_bounds {
            if let Some(end) = bounds.end {
                if end < bounds.start {
                    return Err(PlanError::Invalid(format!(
                        "source '{}' has inverted date bounds",
                        source.name
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Resolves a `--sources` selection; `None` means all.
    pub fn select_sources(&self, names: Option<&[String]>) -> Result<Vec<&SourceConfig>, PlanError> {
        match names {
            None => Ok(self.sources.iter().collect()),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.source(name).ok_or_else(|| {
                        PlanError::Invalid(format!("unknown source '{name}' in selection"))
                    })
                })
                .collect(),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::query::QueryTemplate;
    use serde_json::json;

    fn plan_json() -> serde_json::Value {
        json!({
            "sources": [
                {
                    "name": "orders",
                    "query": "SELECT * FROM orders WHERE created_at >= '{start_date}' AND created_at < '{end_date}' ORDER BY id LIMIT {batch_size} OFFSET {batch_offset}",
                    "full_query": "SELECT * FROM orders ORDER BY id LIMIT {batch_size} OFFSET {batch_offset}",
                    "primary_key": ["id"],
                    "date_column": "created_at"
                },
                {
                    "name": "customers",
                    "query": "SELECT * FROM customers ORDER BY id LIMIT {batch_size} OFFSET {batch_offset}",
                    "primary_key": ["id"],
                    "incremental": false
                }
            ]
        })
    }

    fn load(value: serde_json::Value) -> Result<ValidatedPlan, PlanError> {
        let plan: ExtractionPlan = serde_json::from_value(value).unwrap();
        ValidatedPlan::from_plan(plan)
    }

    #[test]
    fn accepts_minimal_plan_with_defaults() {
        let plan = load(plan_json()).unwrap();
        assert_eq!(plan.max_workers, 4);
        assert_eq!(plan.default_batch_size, 10_000);
        assert_eq!(plan.sources.len(), 2);
        assert!(plan.sources[0].incremental);
        assert!(!plan.sources[1].incremental);
    }

    #[test]
    fn rejects_empty_primary_key() {
        let mut value = plan_json();
        value["sources"][0]["primary_key"] = json!([]);
        assert!(matches!(load(value), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn rejects_incremental_source_without_date_column() {
        let mut value = plan_json();
        value["sources"][0]
            .as_object_mut()
            .unwrap()
            .remove("date_column");
        assert!(matches!(load(value), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn rejects_duplicate_source_names() {
        let mut value = plan_json();
        value["sources"][1]["name"] = json!("orders");
        assert!(matches!(load(value), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_relationship_target() {
        let mut value = plan_json();
        value["sources"][0]["quality"] = json!({
            "relationships": [
                { "column": "customer_id", "references_source": "nope", "references_column": "id" }
            ]
        });
        assert!(matches!(load(value), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn selection_resolves_names() {
        let plan = load(plan_json()).unwrap();

        let all = plan.select_sources(None).unwrap();
        assert_eq!(all.len(), 2);

        let picked = plan
            .select_sources(Some(&["customers".to_string()]))
            .unwrap();
        assert_eq!(picked[0].name, "customers");

        assert!(plan
            .select_sources(Some(&["missing".to_string()]))
            .is_err());
    }

    #[test]
    fn rejects_windowed_query_without_full_variant() {
        let mut value = plan_json();
        value["sources"][0]
            .as_object_mut()
            .unwrap()
            .remove("full_query");
        assert!(matches!(load(value), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn rejects_full_query_with_window_placeholders() {
        let mut value = plan_json();
        value["sources"][0]["full_query"] =
            json!("SELECT * FROM orders WHERE created_at >= '{start_date}' LIMIT {batch_size} OFFSET {batch_offset}");
        assert!(matches!(load(value), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn query_template_round_trips_through_plan() {
        let plan = load(plan_json()).unwrap();
        let template: &QueryTemplate = &plan.sources[0].query;
        assert!(template.requires_window());
        assert!(!plan.sources[1].query.requires_window());
    }
}
