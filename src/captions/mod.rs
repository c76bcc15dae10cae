use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod resolver;
pub mod youtube;

pub use resolver::{CaptionResolver, ResolutionStrategy};
pub use youtube::YtDlpCaptionService;

use crate::listing::Item;
use crate::utils::truncate_chars;
use crate::{HarvestError, Result};

/// Maximum number of characters of an error message kept on an outcome
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// One available caption stream for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language code as reported by the service (`ja`, `en`, `en-GB`, ...)
    pub language_code: String,

    /// Human readable language name, when known
    pub language_name: Option<String>,

    /// Whether the track was generated by speech recognition
    pub is_generated: bool,

    /// Where the track content can be downloaded from
    pub url: String,
}

impl CaptionTrack {
    pub fn manual(language_code: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            language_name: None,
            is_generated: false,
            url: url.into(),
        }
    }

    pub fn generated(language_code: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            is_generated: true,
            ..Self::manual(language_code, url)
        }
    }
}

/// One timed span of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub text: String,

    /// Start offset in seconds
    #[serde(rename = "start")]
    pub start_offset: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl CaptionSegment {
    pub fn new(text: impl Into<String>, start_offset: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start_offset,
            duration,
        }
    }
}

/// Access to a caption provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionService: Send + Sync {
    /// List the caption tracks available for a video
    async fn list_tracks(&self, item_id: &str) -> Result<Vec<CaptionTrack>>;

    /// Download the segments of one track, in order
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionSegment>>;

    /// Pick a generated track for the first requested language that has one
    async fn find_generated_track(
        &self,
        tracks: &[CaptionTrack],
        languages: &[String],
    ) -> Result<CaptionTrack> {
        ResolutionStrategy::Generated
            .select(tracks, languages)
            .ok_or_else(|| {
                anyhow::Error::from(HarvestError::NoGeneratedTrack {
                    languages: languages.join(", "),
                })
            })
    }
}

/// Terminal state of one video's caption resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Success,
    NoTranscript,
    Disabled,
    Error,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Success => "success",
            FetchStatus::NoTranscript => "no_transcript",
            FetchStatus::Disabled => "disabled",
            FetchStatus::Error => "error",
        }
    }

    /// Classify a service failure message
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("disabled") {
            FetchStatus::Disabled
        } else if lower.contains("not found") {
            FetchStatus::NoTranscript
        } else {
            FetchStatus::Error
        }
    }
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving captions for one item.
///
/// A successful outcome carries the segments and their joined text and no error
/// message; any other status carries only an error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    item_id: String,
    title: String,
    source_label: String,
    url: String,
    status: FetchStatus,
    full_text: String,
    segments: Vec<CaptionSegment>,
    error_message: String,
    fetched_at: DateTime<Utc>,
}

impl FetchOutcome {
    /// Successful outcome. Content without any text becomes a `NoTranscript` failure.
    pub fn success(item: &Item, segments: Vec<CaptionSegment>) -> Self {
        if segments.iter().all(|s| s.text.trim().is_empty()) {
            return Self::failure(item, FetchStatus::NoTranscript, "Caption content is empty");
        }

        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            item_id: item.id().to_string(),
            title: item.title().to_string(),
            source_label: item.source_label().to_string(),
            url: item.url().to_string(),
            status: FetchStatus::Success,
            full_text,
            segments,
            error_message: String::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Failed outcome with a truncated error message
    pub fn failure(item: &Item, status: FetchStatus, message: &str) -> Self {
        debug_assert!(status != FetchStatus::Success);

        let message = message.trim();
        let message = if message.is_empty() {
            "No transcript found"
        } else {
            message
        };

        Self {
            item_id: item.id().to_string(),
            title: item.title().to_string(),
            source_label: item.source_label().to_string(),
            url: item.url().to_string(),
            status,
            full_text: String::new(),
            segments: Vec::new(),
            error_message: truncate_chars(message, MAX_ERROR_MESSAGE_CHARS),
            fetched_at: Utc::now(),
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn segments(&self) -> &[CaptionSegment] {
        &self.segments
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Length of the transcript text in characters
    pub fn text_len(&self) -> usize {
        self.full_text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item::new("vid1", "タイトル", "チャンネル")
    }

    #[test]
    fn test_success_joins_segments_in_order() {
        let outcome = FetchOutcome::success(
            &item(),
            vec![
                CaptionSegment::new("こんにちは", 0.0, 1.5),
                CaptionSegment::new("世界", 1.5, 2.0),
                CaptionSegment::new("です", 3.5, 1.0),
            ],
        );

        assert!(outcome.is_success());
        assert_eq!(outcome.full_text(), "こんにちは 世界 です");
        assert_eq!(outcome.segments().len(), 3);
        assert_eq!(outcome.segments()[1].start_offset, 1.5);
        assert!(outcome.error_message().is_empty());
        assert_eq!(outcome.text_len(), 11);
    }

    #[test]
    fn test_success_without_text_is_no_transcript() {
        for segments in [Vec::new(), vec![CaptionSegment::new(" \n", 0.0, 1.0)]] {
            let outcome = FetchOutcome::success(&item(), segments);

            assert_eq!(outcome.status(), FetchStatus::NoTranscript);
            assert!(outcome.full_text().is_empty());
            assert_eq!(outcome.error_message(), "Caption content is empty");
        }
    }

    #[test]
    fn test_failure_truncates_message() {
        let long = "x".repeat(800);
        let outcome = FetchOutcome::failure(&item(), FetchStatus::Error, &long);

        assert_eq!(outcome.error_message().chars().count(), MAX_ERROR_MESSAGE_CHARS);
        assert!(outcome.full_text().is_empty());
        assert!(outcome.segments().is_empty());
    }

    #[test]
    fn test_failure_never_has_empty_message() {
        let outcome = FetchOutcome::failure(&item(), FetchStatus::NoTranscript, "  ");
        assert_eq!(outcome.error_message(), "No transcript found");
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            FetchStatus::classify("Subtitles are DISABLED for this video"),
            FetchStatus::Disabled
        );
        assert_eq!(
            FetchStatus::classify("Transcript Not Found for vid1"),
            FetchStatus::NoTranscript
        );
        assert_eq!(FetchStatus::classify("connection reset"), FetchStatus::Error);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&FetchStatus::NoTranscript).unwrap();
        assert_eq!(json, "\"no_transcript\"");
    }

    #[tokio::test]
    async fn test_default_find_generated_track() {
        struct Listing;

        #[async_trait]
        impl CaptionService for Listing {
            async fn list_tracks(&self, _item_id: &str) -> Result<Vec<CaptionTrack>> {
                Ok(Vec::new())
            }

            async fn fetch_track(&self, _track: &CaptionTrack) -> Result<Vec<CaptionSegment>> {
                Ok(Vec::new())
            }
        }

        let tracks = vec![
            CaptionTrack::manual("ja", "m-ja"),
            CaptionTrack::generated("en", "g-en"),
            CaptionTrack::generated("ja", "g-ja"),
        ];
        let langs = vec!["ja".to_string(), "en".to_string()];

        let found = Listing.find_generated_track(&tracks, &langs).await.unwrap();
        assert_eq!(found.url, "g-ja");

        let err = Listing
            .find_generated_track(&tracks, &["fr".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("fr"));
    }
}
