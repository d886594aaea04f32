use crate::error::CliError;
use engine_config::report::summary::RunSummary;
use engine_core::checkpoint::models::ExtractionCheckpoint;
use std::collections::BTreeMap;

pub fn print_summaries(summaries: &[RunSummary]) {
    println!(
        "{:<20} {:<10} {:>10} {:>10} {:>8} {:<10} {}",
        "Source", "Status", "Extracted", "Loaded", "Retries", "Verdict", "Error"
    );
    println!("{}", "-".repeat(88));
    for summary in summaries {
        let verdict = summary
            .verdict
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let error = match (&summary.failed_phase, &summary.error) {
            (Some(phase), Some(error)) => format!("{phase}: {error}"),
            (None, Some(error)) => error.clone(),
            _ => String::new(),
        };
        println!(
            "{:<20} {:<10} {:>10} {:>10} {:>8} {:<10} {}",
            summary.source,
            summary.status.to_string(),
            summary.rows_extracted,
            summary.rows_loaded,
            summary.retries,
            verdict,
            error
        );
    }
}

pub fn print_checkpoints(checkpoints: &BTreeMap<String, ExtractionCheckpoint>) {
    if checkpoints.is_empty() {
        println!("No checkpoints recorded.");
        return;
    }
    println!(
        "{:<20} {:<28} {:<12} {}",
        "Source", "Watermark", "Status", "Last run"
    );
    println!("{}", "-".repeat(76));
    for (source, checkpoint) in checkpoints {
        let watermark = checkpoint
            .last_extraction_watermark
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:<20} {:<28} {:<12} {}",
            source,
            watermark,
            checkpoint.status.to_string(),
            checkpoint.last_run_id
        );
    }
}

pub fn print_checkpoints_json(
    checkpoints: &BTreeMap<String, ExtractionCheckpoint>,
) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(checkpoints)?;
    println!("{json}");
    Ok(())
}
