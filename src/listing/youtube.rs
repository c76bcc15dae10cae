use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{Item, ItemLister};
use crate::Result;

/// Channel lister backed by `yt-dlp --flat-playlist`
pub struct YtDlpLister {
    yt_dlp_path: String,
    timeout: Duration,
}

/// One line of `yt-dlp -j --flat-playlist` output
#[derive(Debug, Deserialize)]
struct ListingRecord {
    #[serde(default)]
    id: String,
    title: Option<String>,
    channel: Option<String>,
    playlist_uploader: Option<String>,
    view_count: Option<u64>,
    duration: Option<f64>,
}

impl YtDlpLister {
    pub fn new(yt_dlp_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            timeout,
        }
    }

    /// Run yt-dlp against the collection's video tab and return its stdout
    async fn run_listing(&self, collection_ref: &str) -> Result<String> {
        let target = videos_tab(collection_ref);
        tracing::debug!("Listing collection: {}", target);

        let command = Command::new(&self.yt_dlp_path)
            .args(["--flat-playlist", "-j", target.as_str()])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, command).await {
            Ok(output) => output?,
            Err(_) => anyhow::bail!(
                "Timeout after {}s while listing {}",
                self.timeout.as_secs(),
                collection_ref
            ),
        };

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ItemLister for YtDlpLister {
    async fn list_items(&self, collection_ref: &str, max_items: Option<usize>) -> Vec<Item> {
        match self.run_listing(collection_ref).await {
            Ok(stdout) => parse_listing(&stdout, max_items),
            Err(e) => {
                tracing::error!("Error fetching collection items from {}: {:#}", collection_ref, e);
                Vec::new()
            }
        }
    }
}

impl Default for YtDlpLister {
    fn default() -> Self {
        Self::new("yt-dlp", Duration::from_secs(120))
    }
}

fn videos_tab(collection_ref: &str) -> String {
    let trimmed = collection_ref.trim_end_matches('/');
    if trimmed.ends_with("/videos") {
        trimmed.to_string()
    } else {
        format!("{}/videos", trimmed)
    }
}

/// Parse line-delimited listing records, most viewed first.
///
/// Malformed lines and records without an id are skipped.
pub fn parse_listing(stdout: &str, max_items: Option<usize>) -> Vec<Item> {
    let mut items: Vec<Item> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<ListingRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("Skipping malformed listing line: {}", e);
                None
            }
        })
        .filter(|record| !record.id.is_empty())
        .map(|record| {
            let uploader = record
                .channel
                .filter(|c| !c.is_empty())
                .or(record.playlist_uploader)
                .unwrap_or_default();
            let duration = record.duration.unwrap_or(0.0).max(0.0) as u64;

            Item::new(record.id, record.title.unwrap_or_default(), uploader)
                .with_stats(record.view_count.unwrap_or(0), duration)
        })
        .collect();

    items.sort_by(|a, b| b.view_count().cmp(&a.view_count()));

    if let Some(max) = max_items {
        items.truncate(max);
    }

    items
}
