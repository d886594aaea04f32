use crate::error::PipelineError;
use crate::workers;
use chrono::{DateTime, Utc};
use connectors::executor::QueryExecutor;
use connectors::sink::{Destination, LoadSink};
use engine_config::report::finding::{ValidationResult, Verdict};
use engine_config::report::summary::{Phase, PhaseTiming, RunStatus, RunSummary, TransformStats};
use engine_config::settings::source::SourceConfig;
use engine_config::settings::validated::ValidatedPlan;
use engine_core::checkpoint::models::CheckpointStatus;
use engine_core::checkpoint::CheckpointStore;
use engine_processing::extract::engine::ExtractionEngine;
use engine_processing::transform::pipeline::TransformPipeline;
use engine_processing::validation::engine::ValidationEngine;
use engine_processing::validation::{ReferenceSets, ValidationContext};
use model::core::identifiers::{RunId, SourceId};
use model::core::value::Value;
use model::extraction::mode::ExtractionMode;
use model::extraction::window::ExtractionWindow;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: ExtractionMode,
    pub stop_on_validation_failure: bool,
}

/// Result of one whole invocation across sources.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub summaries: Vec<RunSummary>,
    /// Shutdown was requested; sources not yet started were skipped.
    pub cancelled: bool,
}

impl RunOutcome {
    pub fn any_failed(&self) -> bool {
        self.summaries.iter().any(|s| s.status.is_failed())
    }
}

/// Drives each selected source through
/// EXTRACT -> VALIDATE -> TRANSFORM -> LOAD -> COMMIT, isolating failures
/// per source and committing the checkpoint only after a successful load.
pub struct PipelineOrchestrator {
    plan: ValidatedPlan,
    sink: Arc<dyn LoadSink>,
    store: Arc<dyn CheckpointStore>,
    engine: ExtractionEngine,
    cancel: CancellationToken,
}

impl PipelineOrchestrator {
    pub fn new(
        plan: ValidatedPlan,
        executor: Arc<dyn QueryExecutor>,
        sink: Arc<dyn LoadSink>,
        store: Arc<dyn CheckpointStore>,
        cancel: CancellationToken,
    ) -> Self {
        let engine = ExtractionEngine::new(
            executor,
            Arc::clone(&store),
            plan.default_batch_size,
            plan.default_lookback_days,
        );
        Self {
            plan,
            sink,
            store,
            engine,
            cancel,
        }
    }

    /// Runs the pipeline for the selected sources (`None` selects all).
    pub async fn execute(
        &self,
        selection: Option<&[String]>,
        options: RunOptions,
    ) -> Result<RunOutcome, PipelineError> {
        let run_id = RunId::generate();
        let selected = self.plan.select_sources(selection)?;

        info!(
            run_id = %run_id,
            sources = selected.len(),
            mode = %options.mode,
            "Starting pipeline run"
        );

        let reference_sets = self.collect_reference_sets(&selected).await;

        let jobs: Vec<_> = selected
            .iter()
            .map(|config| self.run_source_guarded(config, &run_id, &reference_sets, &options))
            .collect();

        let mut summaries = workers::run_bounded(self.plan.max_workers, jobs).await;
        summaries.sort_by(|a, b| a.source.cmp(&b.source));

        let cancelled = self.cancel.is_cancelled();
        info!(
            run_id = %run_id,
            completed = summaries.len(),
            failed = summaries.iter().filter(|s| s.status.is_failed()).count(),
            cancelled,
            "Pipeline run finished"
        );

        Ok(RunOutcome {
            run_id,
            summaries,
            cancelled,
        })
    }

    /// Extracts the primary-key value sets that the selected sources'
    /// relationships point at. A set that cannot be built is left out; the
    /// referential check reports it as a warning.
    async fn collect_reference_sets(&self, selected: &[&SourceConfig]) -> ReferenceSets {
        let needed: BTreeSet<(String, String)> = selected
            .iter()
            .flat_map(|config| config.quality.relationships.iter())
            .map(|rel| (rel.references_source.clone(), rel.references_column.clone()))
            .collect();

        let mut sets = ReferenceSets::new();
        for (source_name, column) in needed {
            if self.cancel.is_cancelled() {
                break;
            }
            let Some(config) = self.plan.source(&source_name) else {
                continue;
            };

            match self.engine.extract(config, &ExtractionMode::Full).await {
                Ok(dataset) => {
                    let values: HashSet<Value> = dataset
                        .rows
                        .iter()
                        .map(|row| row.get_value(&column))
                        .filter(|value| !value.is_null())
                        .collect();
                    info!(
                        source = %source_name,
                        column = %column,
                        values = values.len(),
                        "Collected reference set"
                    );
                    sets.insert((source_name, column), values);
                }
                Err(err) => {
                    warn!(
                        source = %source_name,
                        error = %err,
                        "Reference set unavailable"
                    );
                }
            }
        }
        sets
    }

    async fn run_source_guarded(
        &self,
        config: &SourceConfig,
        run_id: &RunId,
        reference_sets: &ReferenceSets,
        options: &RunOptions,
    ) -> Option<RunSummary> {
        if self.cancel.is_cancelled() {
            warn!(source = %config.name, "Shutdown requested; skipping source");
            return None;
        }

        let summary = self.run_source(config, run_id, reference_sets, options).await;

        if let Err(err) = summary.write_to(&self.plan.summaries_dir) {
            warn!(source = %config.name, error = %err, "Failed to persist run summary");
        }
        Some(summary)
    }

    /// One source-run state machine. Failures never propagate; they end up
    /// in the returned summary.
    async fn run_source(
        &self,
        config: &SourceConfig,
        run_id: &RunId,
        reference_sets: &ReferenceSets,
        options: &RunOptions,
    ) -> RunSummary {
        // Non-incremental sources are always pulled whole.
        let mode = if !config.incremental && matches!(options.mode, ExtractionMode::Incremental) {
            ExtractionMode::Full
        } else {
            options.mode
        };

        let source_id = SourceId::from(config.name.as_str());
        let mut draft = SummaryDraft::new(config, run_id, &mode);

        let _lease = match self.store.acquire_lock(&source_id, run_id).await {
            Ok(lease) => lease,
            Err(err) => {
                error!(source = %config.name, error = %err, "Cannot acquire source lock");
                return draft.finish(RunStatus::Failed, None, Some(err.to_string()));
            }
        };

        if let Err(err) = self
            .store
            .set_status(&source_id, CheckpointStatus::InProgress, run_id)
            .await
        {
            error!(source = %config.name, error = %err, "Cannot mark source in progress");
            return draft.finish(RunStatus::Failed, None, Some(err.to_string()));
        }

        // EXTRACT
        let timer = Instant::now();
        let dataset = match self.engine.extract(config, &mode).await {
            Ok(dataset) => dataset,
            Err(err) => {
                draft.timed(Phase::Extract, timer);
                error!(source = %config.name, error = %err, "Extraction failed");
                self.mark_failed(&source_id, run_id).await;
                return draft.finish(RunStatus::Failed, Some(Phase::Extract), Some(err.to_string()));
            }
        };
        draft.timed(Phase::Extract, timer);
        draft.window = dataset.window;
        draft.rows_extracted = dataset.row_count();
        draft.retries = dataset.metadata.retries;

        // VALIDATE
        let timer = Instant::now();
        let report = ValidationEngine::standard().run(&ValidationContext {
            dataset: &dataset,
            config,
            reference_sets,
            now: Utc::now(),
        });
        draft.timed(Phase::Validate, timer);
        draft.verdict = Some(report.verdict);
        draft.validation = report.results;

        if report.verdict.is_critical() && options.stop_on_validation_failure {
            warn!(source = %config.name, "Critical verdict; halting before transform");
            self.mark_failed(&source_id, run_id).await;
            return draft.finish(
                RunStatus::Failed,
                Some(Phase::Validate),
                Some("critical validation verdict".into()),
            );
        }
        let degraded = report.verdict != Verdict::Clean;
        let status = if degraded {
            RunStatus::Partial
        } else {
            RunStatus::Succeeded
        };

        // An empty pull is a successful no-op: the destination keeps its
        // previous contents, and only a windowed run advances the watermark
        // over the empty period. An unbounded or already-current run has
        // nothing new to record.
        if dataset.is_empty() {
            info!(source = %config.name, "Nothing extracted; leaving destination untouched");
            return match dataset.window {
                Some(window) => {
                    self.commit_checkpoint(draft, config, &source_id, run_id, window.end, status)
                        .await
                }
                None => {
                    if let Err(err) = self
                        .store
                        .set_status(&source_id, CheckpointStatus::Clean, run_id)
                        .await
                    {
                        warn!(source = %config.name, error = %err, "Could not record clean status");
                    }
                    draft.finish(status, None, None)
                }
            };
        }

        // TRANSFORM
        let timer = Instant::now();
        let (dataset, stats) = TransformPipeline::standard(config, run_id).apply(dataset);
        draft.timed(Phase::Transform, timer);
        draft.transform = Some(stats);

        // LOAD
        let timer = Instant::now();
        let destination = Destination::new(config.destination_name());
        let ack = match self.sink.write(&dataset, &destination).await {
            Ok(ack) => ack,
            Err(err) => {
                draft.timed(Phase::Load, timer);
                error!(source = %config.name, error = %err, "Load failed");
                self.mark_failed(&source_id, run_id).await;
                return draft.finish(RunStatus::Failed, Some(Phase::Load), Some(err.to_string()));
            }
        };
        draft.timed(Phase::Load, timer);
        draft.rows_loaded = ack.rows_written;

        // COMMIT. Full runs advance the watermark to the run start; a
        // windowed run advances it to the window end.
        let watermark = dataset
            .window
            .map(|w| w.end)
            .unwrap_or(draft.started_at);
        self.commit_checkpoint(draft, config, &source_id, run_id, watermark, status)
            .await
    }

    async fn commit_checkpoint(
        &self,
        mut draft: SummaryDraft,
        config: &SourceConfig,
        source_id: &SourceId,
        run_id: &RunId,
        watermark: DateTime<Utc>,
        status: RunStatus,
    ) -> RunSummary {
        let timer = Instant::now();
        if let Err(err) = self.store.commit(source_id, watermark, run_id).await {
            draft.timed(Phase::Commit, timer);
            // Data is loaded but the watermark is not advanced; the next
            // run re-extracts the same window against an idempotent sink.
            error!(source = %config.name, error = %err, "Checkpoint commit failed");
            self.mark_failed(source_id, run_id).await;
            return draft.finish(RunStatus::Failed, Some(Phase::Commit), Some(err.to_string()));
        }
        draft.timed(Phase::Commit, timer);

        info!(
            source = %config.name,
            status = %status,
            rows = draft.rows_loaded,
            "Source run complete"
        );
        draft.finish(status, None, None)
    }

    async fn mark_failed(&self, source: &SourceId, run_id: &RunId) {
        if let Err(err) = self
            .store
            .set_status(source, CheckpointStatus::Failed, run_id)
            .await
        {
            warn!(source = %source, error = %err, "Could not record failed status");
        }
    }
}

struct SummaryDraft {
    run_id: String,
    source: String,
    mode: String,
    window: Option<ExtractionWindow>,
    rows_extracted: usize,
    rows_loaded: usize,
    retries: usize,
    verdict: Option<Verdict>,
    validation: Vec<ValidationResult>,
    transform: Option<TransformStats>,
    timings: Vec<PhaseTiming>,
    started_at: DateTime<Utc>,
}

impl SummaryDraft {
    fn new(config: &SourceConfig, run_id: &RunId, mode: &ExtractionMode) -> Self {
        Self {
            run_id: run_id.as_str().to_string(),
            source: config.name.clone(),
            mode: mode.to_string(),
            window: None,
            rows_extracted: 0,
            rows_loaded: 0,
            retries: 0,
            verdict: None,
            validation: Vec::new(),
            transform: None,
            timings: Vec::new(),
            started_at: Utc::now(),
        }
    }

    fn timed(&mut self, phase: Phase, timer: Instant) {
        self.timings.push(PhaseTiming::new(phase, timer.elapsed()));
    }

    fn finish(
        self,
        status: RunStatus,
        failed_phase: Option<Phase>,
        error: Option<String>,
    ) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            source: self.source,
            status,
            mode: self.mode,
            window: self.window,
            rows_extracted: self.rows_extracted,
            rows_loaded: self.rows_loaded,
            retries: self.retries,
            verdict: self.verdict,
            validation: self.validation,
            transform: self.transform,
            timings: self.timings,
            failed_phase,
            error,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
