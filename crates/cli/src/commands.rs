use crate::error::CliError;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use model::extraction::{mode::ExtractionMode, window::ExtractionWindow};

#[derive(Subcommand)]
pub enum Commands {
    /// Run the extraction pipeline for the selected sources
    Run {
        #[arg(long, help = "Plan file path")]
        config: String,

        #[arg(
            long,
            value_delimiter = ',',
            help = "Comma-separated source names, or 'all' (default)"
        )]
        sources: Option<Vec<String>>,

        #[arg(
            long,
            conflicts_with_all = ["start_date", "end_date", "last_n_days"],
            help = "Extract from each source's checkpoint watermark (default)"
        )]
        incremental: bool,

        #[arg(long, conflicts_with = "incremental", help = "Ignore checkpoints and pull everything")]
        full: bool,

        #[arg(long, conflicts_with = "full", help = "Custom window start (RFC 3339 or YYYY-MM-DD)")]
        start_date: Option<String>,

        #[arg(long, conflicts_with = "full", help = "Custom window end, exclusive; defaults to now")]
        end_date: Option<String>,

        #[arg(
            long,
            conflicts_with_all = ["full", "start_date", "end_date"],
            help = "Shorthand for a custom window covering the last N days"
        )]
        last_n_days: Option<i64>,

        #[arg(long, help = "Fail a source run on a critical validation verdict")]
        stop_on_validation_failure: bool,
    },
    /// Show the persisted per-source checkpoints
    Checkpoints {
        #[arg(long, help = "Plan file path")]
        config: String,

        #[arg(long, help = "Print as JSON instead of a table")]
        json: bool,
    },
    /// Validate the plan file and print it as resolved JSON
    Plan {
        #[arg(long, help = "Plan file path")]
        config: String,
    },
}

/// Maps the window flags onto an extraction mode.
pub fn resolve_mode(
    full: bool,
    start_date: Option<&str>,
    end_date: Option<&str>,
    last_n_days: Option<i64>,
    now: DateTime<Utc>,
) -> Result<ExtractionMode, CliError> {
    if full {
        return Ok(ExtractionMode::Full);
    }

    if let Some(days) = last_n_days {
        let window = ExtractionWindow::last_n_days(days, now).ok_or_else(|| {
            CliError::InvalidArguments(format!("--last-n-days must be positive, got {days}"))
        })?;
        return Ok(ExtractionMode::Custom(window));
    }

    match (start_date, end_date) {
        (None, None) => Ok(ExtractionMode::Incremental),
        (None, Some(_)) => Err(CliError::InvalidArguments(
            "--end-date requires --start-date".into(),
        )),
        (Some(start), end) => {
            let start = parse_timestamp(start)?;
            let end = end.map(parse_timestamp).transpose()?.unwrap_or(now);
            let window = ExtractionWindow::new(start, end).ok_or_else(|| {
                CliError::InvalidArguments("start date must lie before end date".into())
            })?;
            Ok(ExtractionMode::Custom(window))
        }
    }
}

/// `--sources all` (or omitting the flag) selects every source.
pub fn normalize_selection(sources: Option<Vec<String>>) -> Option<Vec<String>> {
    sources.filter(|names| !names.iter().any(|name| name.eq_ignore_ascii_case("all")))
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, CliError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text.trim()) {
        return Ok(ts.with_timezone(&Utc));
    }
    text.trim()
        .parse::<NaiveDate>()
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            CliError::InvalidArguments(format!(
                "'{text}' is not an RFC 3339 timestamp or YYYY-MM-DD date"
            ))
        })
}
