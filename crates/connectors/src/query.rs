use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameterized query text with named placeholders, substituted once per
/// batch: `{start_date}`, `{end_date}`, `{batch_size}`, `{batch_offset}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct QueryTemplate {
    text: String,
}

/// Values substituted into a [`QueryTemplate`] for a single batch fetch.
/// Also handed to the execution capability alongside the rendered text so
/// implementations can bind them natively instead of re-parsing SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub batch_size: usize,
    pub batch_offset: usize,
}

impl QueryTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the template references the extraction window at all.
    pub fn requires_window(&self) -> bool {
        self.text.contains("{start_date}") || self.text.contains("{end_date}")
    }

    pub fn render(&self, params: &QueryParams) -> String {
        let mut rendered = self.text.clone();
        if let Some(start) = params.start_date {
            rendered = rendered.replace("{start_date}", &format_ts(start));
        }
        if let Some(end) = params.end_date {
            rendered = rendered.replace("{end_date}", &format_ts(end));
        }
        rendered = rendered.replace("{batch_size}", &params.batch_size.to_string());
        rendered.replace("{batch_offset}", &params.batch_offset.to_string())
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
