//! Pure renderers for the persisted artifacts. Each takes the outcomes
//! read-only and returns the file content; writing is done by `ResultWriter`.

use anyhow::{Context, Result};

use crate::captions::FetchOutcome;
use crate::utils::{sanitize_filename, truncate_chars};

/// Characters of the error message kept in the summary table
pub const SUMMARY_ERROR_CHARS: usize = 100;

const SUMMARY_HEADER: [&str; 7] = [
    "video_id",
    "title",
    "channel_name",
    "status",
    "text_length",
    "error_message",
    "fetched_at",
];

/// File name of an outcome's individual transcript
pub fn individual_filename(outcome: &FetchOutcome) -> String {
    sanitize_filename(&format!(
        "{}_{}.txt",
        outcome.source_label(),
        outcome.item_id()
    ))
}

/// Header, separator and transcript text of one successful outcome
pub fn format_individual(outcome: &FetchOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("Title: {}\n", outcome.title()));
    out.push_str(&format!("Video ID: {}\n", outcome.item_id()));
    out.push_str(&format!("Channel: {}\n", outcome.source_label()));
    out.push_str(&format!("URL: {}\n", outcome.url()));
    out.push_str(&format!("Fetched at: {}\n", outcome.fetched_at().to_rfc3339()));
    out.push_str(&"=".repeat(60));
    out.push_str("\n\n");
    out.push_str(outcome.full_text());
    out
}

/// Every outcome with all of its fields, in processing order
pub fn format_manifest(outcomes: &[FetchOutcome]) -> Result<String> {
    serde_json::to_string_pretty(outcomes).context("Failed to serialize manifest")
}

/// One CSV row per outcome, header first
pub fn format_summary_csv(outcomes: &[FetchOutcome]) -> String {
    let mut out = csv_row(SUMMARY_HEADER.iter().map(|h| h.to_string()));

    for outcome in outcomes {
        out.push_str(&csv_row([
            outcome.item_id().to_string(),
            outcome.title().to_string(),
            outcome.source_label().to_string(),
            outcome.status().to_string(),
            outcome.text_len().to_string(),
            truncate_chars(outcome.error_message(), SUMMARY_ERROR_CHARS),
            outcome.fetched_at().to_rfc3339(),
        ]));
    }

    out
}

/// Bannered concatenation of the successful transcripts
pub fn format_combined(outcomes: &[FetchOutcome]) -> String {
    let rule = "#".repeat(60);
    let mut out = String::new();

    for outcome in outcomes.iter().filter(|o| o.is_success()) {
        out.push_str(&format!("\n{}\n", rule));
        out.push_str(&format!("# Title: {}\n", outcome.title()));
        out.push_str(&format!("# Video ID: {}\n", outcome.item_id()));
        out.push_str(&format!("# Channel: {}\n", outcome.source_label()));
        out.push_str(&format!("# URL: {}\n", outcome.url()));
        out.push_str(&format!("{}\n\n", rule));
        out.push_str(outcome.full_text());
        out.push_str("\n\n");
    }

    out
}

fn csv_row(fields: impl IntoIterator<Item = String>) -> String {
    let mut row = fields
        .into_iter()
        .map(|f| csv_field(&f))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
