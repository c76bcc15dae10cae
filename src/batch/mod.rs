use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::captions::{CaptionResolver, FetchOutcome, FetchStatus};
use crate::listing::{Item, ItemLister};
use crate::output::ResultWriter;
use crate::utils::{truncate_for_display, validate_and_normalize_url};
use crate::HarvestError;

/// Accumulated outcomes of one or more batch runs, in processing order
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    outcomes: Vec<FetchOutcome>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: FetchOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[FetchOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<FetchOutcome> {
        self.outcomes
    }

    /// Outcomes tagged with a source label
    pub fn for_source<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a FetchOutcome> + 'a {
        self.outcomes
            .iter()
            .filter(move |o| o.source_label() == label)
    }

    pub fn summary(&self) -> RunSummary {
        let count = |status: FetchStatus| {
            self.outcomes
                .iter()
                .filter(|o| o.status() == status)
                .count()
        };

        RunSummary {
            total: self.outcomes.len(),
            success: count(FetchStatus::Success),
            error: count(FetchStatus::Error),
            no_transcript: count(FetchStatus::NoTranscript),
            disabled: count(FetchStatus::Disabled),
        }
    }
}

/// Per-status counts of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub error: usize,
    pub no_transcript: usize,
    pub disabled: usize,
}

impl RunSummary {
    /// Share of successful outcomes in percent, `None` for an empty run
    pub fn success_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.success as f64 / self.total as f64 * 100.0)
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total videos processed: {}", self.total)?;
        writeln!(f, "  ✓ Success: {}", self.success)?;
        writeln!(f, "  ✗ Error: {}", self.error)?;
        writeln!(f, "  - No transcript: {}", self.no_transcript)?;
        writeln!(f, "  - Disabled: {}", self.disabled)?;
        match self.success_rate() {
            Some(rate) => write!(f, "Success rate: {:.1}%", rate),
            None => write!(f, "Success rate: N/A"),
        }
    }
}

/// A channel (or playlist) to harvest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection URL handed to the lister
    pub url: String,

    /// Label attached to every item of the collection
    pub label: String,

    /// Most viewed items to take; all of them when unset
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl Collection {
    pub fn new(url: impl Into<String>, label: impl Into<String>, max_items: Option<usize>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            max_items,
        }
    }
}

/// Parses `URL` or `LABEL=URL`; without a label the last path segment is used
impl FromStr for Collection {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (label, url) = match s.find("=http") {
            Some(idx) => (Some(s[..idx].trim()), &s[idx + 1..]),
            None => (None, s),
        };

        let url = validate_and_normalize_url(url)
            .map_err(|e| HarvestError::InvalidCollection(format!("{}: {}", s, e)))?;

        let label = match label {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => url
                .rsplit('/')
                .find(|segment| !segment.is_empty() && *segment != "videos")
                .map(|segment| {
                    urlencoding::decode(segment)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| segment.to_string())
                })
                .ok_or_else(|| HarvestError::InvalidCollection(s.to_string()))?,
        };

        Ok(Self::new(url, label, None))
    }
}

/// Settings of one batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Caption languages in order of preference
    pub languages: Vec<String>,

    /// Pause between two consecutive items
    pub delay: Duration,

    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            languages: vec!["ja".to_string()],
            delay: Duration::from_secs(1),
            show_progress: true,
        }
    }
}

/// Fetches captions for items one at a time with a fixed pause in between
pub struct BatchOrchestrator {
    resolver: CaptionResolver,
    lister: Box<dyn ItemLister>,
    writer: Option<ResultWriter>,
    options: BatchOptions,
}

impl BatchOrchestrator {
    pub fn new(resolver: CaptionResolver, lister: Box<dyn ItemLister>, options: BatchOptions) -> Self {
        Self {
            resolver,
            lister,
            writer: None,
            options,
        }
    }

    /// Save every successful transcript as soon as it is fetched
    pub fn with_writer(mut self, writer: ResultWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Resolve `items` in order and append each outcome to `results`.
    ///
    /// A failing item never stops the batch.
    pub async fn run(&self, items: &[Item], mut results: ResultSet) -> ResultSet {
        let total = items.len();
        let progress = self.progress_bar(total as u64);

        for (index, item) in items.iter().enumerate() {
            progress.set_message(format!(
                "{} - {}",
                item.id(),
                truncate_for_display(item.title(), 50)
            ));
            tracing::info!(
                "[{}/{}] Fetching: {} - {}",
                index + 1,
                total,
                item.id(),
                truncate_for_display(item.title(), 50)
            );

            let outcome = self.resolver.resolve(item, &self.options.languages).await;

            if outcome.is_success() {
                tracing::info!("  ✓ Success ({} chars)", outcome.text_len());
                if let Some(writer) = &self.writer {
                    if let Err(e) = writer.save_individual(&outcome) {
                        tracing::error!("Failed to save transcript for {}: {:#}", item.id(), e);
                    }
                }
            } else {
                tracing::warn!(
                    "  ✗ {}: {}",
                    outcome.status(),
                    truncate_for_display(outcome.error_message(), 100)
                );
            }

            results.push(outcome);
            progress.inc(1);

            if index + 1 < total {
                tokio::time::sleep(self.options.delay).await;
            }
        }

        progress.finish_and_clear();
        results
    }

    /// List each collection's most viewed items, tag them with the collection
    /// label and run them as one batch per collection
    pub async fn run_from_collections(
        &self,
        collections: &[Collection],
        mut results: ResultSet,
    ) -> ResultSet {
        for collection in collections {
            tracing::info!("{}", "=".repeat(60));
            tracing::info!("Channel: {}", collection.label);
            tracing::info!("URL: {}", collection.url);
            tracing::info!("{}", "=".repeat(60));

            let items: Vec<Item> = self
                .lister
                .list_items(&collection.url, collection.max_items)
                .await
                .into_iter()
                .map(|item| item.with_source_label(collection.label.as_str()))
                .collect();

            tracing::info!("Found {} videos", items.len());
            if items.is_empty() {
                tracing::warn!("No videos found for {}, skipping", collection.label);
                continue;
            }

            let before = results.len();
            results = self.run(&items, results).await;

            let batch = &results.outcomes()[before..];
            let success = batch.iter().filter(|o| o.is_success()).count();
            tracing::info!(
                "Channel summary for {}: {}/{} successful",
                collection.label,
                success,
                batch.len()
            );
        }

        results
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress.set_style(style);
        }
        progress
    }
}
