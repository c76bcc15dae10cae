use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use super::{CheckDetail, RubricReport};

/// Categories scoring below this get an improvement suggestion
const SUGGESTION_THRESHOLD: f64 = 80.0;

/// Human readable report
pub fn render(report: &RubricReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    out.push_str(&format!("{}\nScript Quality Report\n{}\n", rule, rule));
    if let Some(file) = &report.file {
        out.push_str(&format!("File: {}\n", file.display()));
    }
    out.push_str(&format!(
        "Total score: {}\n",
        style(format!("{:.1}/100", report.total_score)).bold()
    ));
    out.push_str(&"-".repeat(60));
    out.push('\n');

    for check in &report.checks {
        out.push_str(&format!(
            "\n[{}] score: {:.1}/100\n",
            check.kind.label(),
            check.score
        ));

        match &check.detail {
            CheckDetail::Coverage { found, details, .. } => {
                if *found > 0 {
                    out.push_str(&format!("  {} found: {}\n", style("✓").green(), found));
                }
                let missing: Vec<&str> = details
                    .iter()
                    .filter(|d| !d.found)
                    .map(|d| d.phrase.as_str())
                    .collect();
                if !missing.is_empty() {
                    out.push_str(&format!(
                        "  {} missing: {}\n",
                        style("✗").red(),
                        missing.join(", ")
                    ));
                }
            }
            CheckDetail::Length {
                char_count,
                target_range,
                status,
            } => {
                out.push_str(&format!(
                    "  characters: {} (target: {})\n",
                    char_count, target_range
                ));
                out.push_str(&format!("  status: {}\n", status.as_str()));
            }
            CheckDetail::Tone { ratio, .. } => {
                out.push_str(&format!("  tone ending ratio: {:.1}%\n", ratio));
            }
        }
    }

    out.push_str(&format!("\n{}\n\n[Suggestions]\n", rule));
    for check in report.checks.iter().filter(|c| c.score < SUGGESTION_THRESHOLD) {
        out.push_str(&format!(
            "- {}: score {:.1}% - needs improvement\n",
            check.kind.label(),
            check.score
        ));
    }

    let verdict = if report.total_score >= 80.0 {
        style("✓ Overall quality is good").green()
    } else if report.total_score >= 60.0 {
        style("△ There are some points to improve").yellow()
    } else {
        style("✗ Major improvement needed").red()
    };
    out.push_str(&format!("{}\n", verdict));

    out
}

/// Write the report as pretty JSON
pub fn save_json(report: &RubricReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs_err::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::score;

    #[test]
    fn test_render_lists_missing_and_suggestions() {
        let text = render(&score("プレアデスの光"));

        assert!(text.contains("Total score: "));
        assert!(text.contains("[Required phrases] score: 7.7/100"));
        assert!(text.contains("missing: 偶然ではありません"));
        assert!(text.contains("characters: 7 (target: 6000-8000)"));
        assert!(text.contains("status: insufficient"));
        assert!(text.contains("- Character count: score 0.1% - needs improvement"));
        assert!(text.contains("Major improvement needed"));
    }

    #[test]
    fn test_save_json_round_trips_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("quality_report.json");

        save_json(&score("銀河連邦"), &path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("銀河連邦"));
        let json: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(json["checks"].as_array().unwrap().len(), 6);
    }
}
