use crate::commands::Commands;
use crate::error::CliError;
use clap::Parser;
use connectors::csv_sink::CsvSink;
use connectors::postgres::PostgresExecutor;
use engine_config::plan::ExtractionPlan;
use engine_config::settings::validated::ValidatedPlan;
use engine_core::checkpoint::CheckpointStore;
use engine_core::checkpoint::json_store::JsonCheckpointStore;
use engine_runtime::orchestrator::{PipelineOrchestrator, RunOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod signals;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
// Shell convention for a SIGINT-terminated process: 128 + 2.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "tidemark", version = "0.1.0", about = "Incremental extraction pipeline")]
struct Cli {
    /// Log level filter (also honors RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Commands::Run {
            config,
            sources,
            incremental: _,
            full,
            start_date,
            end_date,
            last_n_days,
            stop_on_validation_failure,
        } => {
            let mode = commands::resolve_mode(
                full,
                start_date.as_deref(),
                end_date.as_deref(),
                last_n_days,
                chrono::Utc::now(),
            )?;
            let selection = commands::normalize_selection(sources);
            let options = RunOptions {
                mode,
                stop_on_validation_failure,
            };
            run_pipeline(&config, selection.as_deref(), options).await
        }
        Commands::Checkpoints { config, json } => {
            let plan = load_plan(&config)?;
            let store = JsonCheckpointStore::new(&plan.checkpoint_path)?;
            let checkpoints = store.all().await?;
            if json {
                output::print_checkpoints_json(&checkpoints)?;
            } else {
                output::print_checkpoints(&checkpoints);
            }
            Ok(EXIT_SUCCESS)
        }
        Commands::Plan { config } => {
            let raw = ExtractionPlan::from_file(Path::new(&config))?;
            ValidatedPlan::from_plan(raw.clone())?;
            let json = serde_json::to_string_pretty(&raw)?;
            println!("{json}");
            Ok(EXIT_SUCCESS)
        }
    }
}

fn load_plan(path: &str) -> Result<ValidatedPlan, CliError> {
    let raw = ExtractionPlan::from_file(Path::new(path))?;
    Ok(ValidatedPlan::from_plan(raw)?)
}

fn exit_code(cancelled: bool, any_failed: bool) -> i32 {
    if cancelled {
        EXIT_INTERRUPTED
    } else if any_failed {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

async fn run_pipeline(
    config: &str,
    selection: Option<&[String]>,
    options: RunOptions,
) -> Result<i32, CliError> {
    let plan = load_plan(config)?;
    let database_url = plan.database_url.clone().ok_or_else(|| {
        CliError::InvalidArguments("plan has no database_url; required to run".into())
    })?;

    let executor = PostgresExecutor::connect(&database_url).await?;
    let sink = CsvSink::new(&plan.output_dir);
    let store = JsonCheckpointStore::new(&plan.checkpoint_path)?;

    let orchestrator = PipelineOrchestrator::new(
        plan,
        Arc::new(executor),
        Arc::new(sink),
        Arc::new(store),
        signals::shutdown_token(),
    );

    let outcome = orchestrator.execute(selection, options).await?;
    output::print_summaries(&outcome.summaries);

    if outcome.cancelled {
        info!("Run interrupted by shutdown request");
    }
    Ok(exit_code(outcome.cancelled, outcome.any_failed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_rank_interruption_over_failure() {
        assert_eq!(exit_code(false, false), 0);
        assert_eq!(exit_code(false, true), 1);
        assert_eq!(exit_code(true, true), 130);
    }

    #[test]
    fn incremental_flag_rejects_window_flags() {
        let result = Cli::try_parse_from([
            "tidemark",
            "run",
            "--config",
            "plan.json",
            "--incremental",
            "--start-date",
            "2025-01-01",
        ]);
        assert!(result.is_err());

        let alone = Cli::try_parse_from([
            "tidemark",
            "run",
            "--config",
            "plan.json",
            "--incremental",
        ]);
        assert!(alone.is_ok());
    }
}
