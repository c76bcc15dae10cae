use super::{CaptionService, CaptionTrack, FetchOutcome, FetchStatus};
use crate::listing::Item;

/// One way of choosing a caption track from a video's track list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// First requested language with a track of exactly that code; a manual
    /// track beats a generated one of the same code
    ExactLanguage,
    /// Generated track for the first requested language that has one
    Generated,
    /// Whatever track is listed first
    FirstAvailable,
}

impl ResolutionStrategy {
    /// Order in which strategies are tried
    pub const DEFAULT_ORDER: [ResolutionStrategy; 3] = [
        ResolutionStrategy::ExactLanguage,
        ResolutionStrategy::Generated,
        ResolutionStrategy::FirstAvailable,
    ];

    /// Choose a track, without touching the network
    pub fn select(&self, tracks: &[CaptionTrack], languages: &[String]) -> Option<CaptionTrack> {
        match self {
            ResolutionStrategy::ExactLanguage => languages
                .iter()
                .find_map(|lang| {
                    tracks
                        .iter()
                        .find(|t| !t.is_generated && &t.language_code == lang)
                        .or_else(|| tracks.iter().find(|t| &t.language_code == lang))
                })
                .cloned(),
            ResolutionStrategy::Generated => languages
                .iter()
                .find_map(|lang| {
                    tracks
                        .iter()
                        .find(|t| t.is_generated && &t.language_code == lang)
                })
                .cloned(),
            ResolutionStrategy::FirstAvailable => tracks.first().cloned(),
        }
    }

    /// Failures inside a guarded strategy fall through to the next one
    pub fn is_guarded(&self) -> bool {
        matches!(self, ResolutionStrategy::Generated)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResolutionStrategy::ExactLanguage => "exact-language",
            ResolutionStrategy::Generated => "generated",
            ResolutionStrategy::FirstAvailable => "first-available",
        }
    }
}

/// Picks and downloads the best caption track for a video
pub struct CaptionResolver {
    service: Box<dyn CaptionService>,
    strategies: Vec<ResolutionStrategy>,
}

impl CaptionResolver {
    pub fn new(service: Box<dyn CaptionService>) -> Self {
        Self {
            service,
            strategies: ResolutionStrategy::DEFAULT_ORDER.to_vec(),
        }
    }

    /// Resolve one item into its terminal outcome. Never fails: every service
    /// error is classified into the outcome's status.
    pub async fn resolve(&self, item: &Item, languages: &[String]) -> FetchOutcome {
        let tracks = match self.service.list_tracks(item.id()).await {
            Ok(tracks) => tracks,
            Err(e) => return classified_failure(item, &e),
        };

        if tracks.is_empty() {
            return FetchOutcome::failure(
                item,
                FetchStatus::NoTranscript,
                "No caption tracks available",
            );
        }

        tracing::debug!(
            "{} caption tracks for {}: {}",
            tracks.len(),
            item.id(),
            tracks
                .iter()
                .map(|t| format!(
                    "{}{}",
                    t.language_code,
                    if t.is_generated { "(auto)" } else { "" }
                ))
                .collect::<Vec<_>>()
                .join(", ")
        );

        for strategy in &self.strategies {
            let Some(track) = self.select(*strategy, &tracks, languages).await else {
                continue;
            };

            match self.service.fetch_track(&track).await {
                Ok(segments) => {
                    tracing::debug!(
                        "Resolved {} via {} strategy ({})",
                        item.id(),
                        strategy.name(),
                        track.language_code
                    );
                    return FetchOutcome::success(item, segments);
                }
                Err(e) if strategy.is_guarded() => {
                    tracing::warn!(
                        "Fetching {} track {} failed, falling back: {:#}",
                        strategy.name(),
                        track.language_code,
                        e
                    );
                }
                Err(e) => return classified_failure(item, &e),
            }
        }

        FetchOutcome::failure(item, FetchStatus::NoTranscript, "No transcript found")
    }

    async fn select(
        &self,
        strategy: ResolutionStrategy,
        tracks: &[CaptionTrack],
        languages: &[String],
    ) -> Option<CaptionTrack> {
        match strategy {
            ResolutionStrategy::Generated => {
                match self.service.find_generated_track(tracks, languages).await {
                    Ok(track) => Some(track),
                    Err(e) => {
                        tracing::debug!("No generated track usable: {:#}", e);
                        None
                    }
                }
            }
            other => other.select(tracks, languages),
        }
    }
}

fn classified_failure(item: &Item, error: &anyhow::Error) -> FetchOutcome {
    let message = format!("{:#}", error);
    FetchOutcome::failure(item, FetchStatus::classify(&message), &message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::{CaptionSegment, MockCaptionService};

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn item() -> Item {
        Item::new("vid1", "Title", "Channel")
    }

    fn segments(text: &str) -> Vec<CaptionSegment> {
        vec![
            CaptionSegment::new(text, 0.0, 1.0),
            CaptionSegment::new("end", 1.0, 1.0),
        ]
    }

    #[test]
    fn test_exact_language_prefers_manual_track() {
        let tracks = vec![
            CaptionTrack::generated("en", "g-en"),
            CaptionTrack::manual("en", "m-en"),
        ];

        let chosen = ResolutionStrategy::ExactLanguage
            .select(&tracks, &langs(&["en"]))
            .unwrap();
        assert_eq!(chosen.url, "m-en");
    }

    #[test]
    fn test_exact_language_is_first_match_by_preference() {
        let tracks = vec![
            CaptionTrack::manual("en", "m-en"),
            CaptionTrack::generated("ja", "g-ja"),
        ];

        let chosen = ResolutionStrategy::ExactLanguage
            .select(&tracks, &langs(&["ja", "en"]))
            .unwrap();
        assert_eq!(chosen.url, "g-ja");

        assert!(ResolutionStrategy::ExactLanguage
            .select(&tracks, &langs(&["fr"]))
            .is_none());
    }

    #[test]
    fn test_generated_and_first_available_selection() {
        let tracks = vec![
            CaptionTrack::manual("de", "m-de"),
            CaptionTrack::generated("en", "g-en"),
        ];

        assert_eq!(
            ResolutionStrategy::Generated
                .select(&tracks, &langs(&["ja", "en"]))
                .unwrap()
                .url,
            "g-en"
        );
        assert!(ResolutionStrategy::Generated
            .select(&tracks, &langs(&["de"]))
            .is_none());
        assert_eq!(
            ResolutionStrategy::FirstAvailable
                .select(&tracks, &[])
                .unwrap()
                .url,
            "m-de"
        );
        assert!(ResolutionStrategy::FirstAvailable.select(&[], &[]).is_none());
    }

    #[tokio::test]
    async fn test_manual_exact_match_wins_over_generated() {
        let mut service = MockCaptionService::new();
        service.expect_list_tracks().returning(|_| {
            Ok(vec![
                CaptionTrack::generated("en", "g-en"),
                CaptionTrack::manual("en", "m-en"),
            ])
        });
        service.expect_find_generated_track().never();
        service
            .expect_fetch_track()
            .withf(|track| track.url == "m-en")
            .times(1)
            .returning(|_| Ok(segments("hello")));

        let resolver = CaptionResolver::new(Box::new(service));
        let outcome = resolver.resolve(&item(), &langs(&["ja", "en"])).await;
        assert_eq!(outcome.status(), FetchStatus::Success);
        assert_eq!(outcome.full_text(), "hello end");
    }

    #[tokio::test]
    async fn test_generated_exact_code_beats_later_manual_preference() {
        let mut service = MockCaptionService::new();
        service.expect_list_tracks().returning(|_| {
            Ok(vec![
                CaptionTrack::manual("en", "m-en"),
                CaptionTrack::generated("ja", "g-ja"),
            ])
        });
        service.expect_find_generated_track().never();
        service
            .expect_fetch_track()
            .withf(|track| track.url == "g-ja")
            .times(1)
            .returning(|_| Ok(segments("generated")));

        let resolver = CaptionResolver::new(Box::new(service));
        let outcome = resolver.resolve(&item(), &langs(&["ja", "en"])).await;
        assert!(outcome.is_success());
        assert!(outcome.full_text().starts_with("generated"));
    }

    #[tokio::test]
    async fn test_zero_tracks_is_no_transcript() {
        let mut service = MockCaptionService::new();
        service.expect_list_tracks().returning(|_| Ok(Vec::new()));
        service.expect_fetch_track().never();

        let resolver = CaptionResolver::new(Box::new(service));
        let outcome = resolver.resolve(&item(), &langs(&["ja"])).await;
        assert_eq!(outcome.status(), FetchStatus::NoTranscript);
        assert!(!outcome.error_message().is_empty());
        assert!(outcome.full_text().is_empty());
    }

    #[tokio::test]
    async fn test_generated_lookup_error_falls_back_to_first_available() {
        let mut service = MockCaptionService::new();
        service.expect_list_tracks().returning(|_| {
            Ok(vec![
                CaptionTrack::manual("ko", "m-ko"),
                CaptionTrack::manual("de", "m-de"),
            ])
        });
        service
            .expect_find_generated_track()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("connection reset by peer")));
        service
            .expect_fetch_track()
            .withf(|track| track.url == "m-ko")
            .times(1)
            .returning(|_| Ok(segments("fallback")));

        let resolver = CaptionResolver::new(Box::new(service));
        let outcome = resolver.resolve(&item(), &langs(&["ja"])).await;
        assert!(outcome.is_success());
        assert!(outcome.full_text().starts_with("fallback"));
    }

    #[tokio::test]
    async fn test_generated_fetch_failure_is_swallowed() {
        let mut service = MockCaptionService::new();
        service.expect_list_tracks().returning(|_| {
            Ok(vec![
                CaptionTrack::manual("de", "m-de"),
                CaptionTrack::generated("ja", "g-ja"),
            ])
        });
        service
            .expect_find_generated_track()
            .returning(|_, _| Ok(CaptionTrack::generated("ja", "g-ja")));
        service
            .expect_fetch_track()
            .withf(|track| track.url == "g-ja")
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("HTTP 429")));
        service
            .expect_fetch_track()
            .withf(|track| track.url == "m-de")
            .times(1)
            .returning(|_| Ok(segments("german")));

        // no exact "ja-JP" track, so the generated lookup runs
        let resolver = CaptionResolver::new(Box::new(service));
        let outcome = resolver.resolve(&item(), &langs(&["ja-JP"])).await;
        assert!(outcome.is_success());
        assert!(outcome.full_text().starts_with("german"));
    }

    #[tokio::test]
    async fn test_exact_fetch_failure_is_classified() {
        let mut service = MockCaptionService::new();
        service
            .expect_list_tracks()
            .returning(|_| Ok(vec![CaptionTrack::manual("ja", "m-ja")]));
        service
            .expect_fetch_track()
            .returning(|_| Err(anyhow::anyhow!("Subtitles are disabled for this video")));
        service.expect_find_generated_track().never();

        let resolver = CaptionResolver::new(Box::new(service));
        let outcome = resolver.resolve(&item(), &langs(&["ja"])).await;
        assert_eq!(outcome.status(), FetchStatus::Disabled);
        assert!(outcome.error_message().contains("disabled"));
    }

    #[tokio::test]
    async fn test_listing_failures_are_classified() {
        for (message, expected) in [
            ("Video unavailable: Not Found", FetchStatus::NoTranscript),
            ("Transcripts are Disabled", FetchStatus::Disabled),
            ("network unreachable", FetchStatus::Error),
        ] {
            let mut service = MockCaptionService::new();
            service
                .expect_list_tracks()
                .returning(move |_| Err(anyhow::anyhow!(message)));
            service.expect_fetch_track().never();

            let resolver = CaptionResolver::new(Box::new(service));
            let outcome = resolver.resolve(&item(), &langs(&["ja"])).await;
            assert_eq!(outcome.status(), expected, "message: {}", message);
            assert_eq!(outcome.error_message(), message);
        }
    }

    #[tokio::test]
    async fn test_empty_track_content_is_no_transcript() {
        let mut service = MockCaptionService::new();
        service
            .expect_list_tracks()
            .returning(|_| Ok(vec![CaptionTrack::manual("ja", "m-ja")]));
        service
            .expect_fetch_track()
            .returning(|_| Ok(vec![CaptionSegment::new(" ", 0.0, 1.0)]));

        let resolver = CaptionResolver::new(Box::new(service));
        let outcome = resolver.resolve(&item(), &langs(&["ja"])).await;
        assert_eq!(outcome.status(), FetchStatus::NoTranscript);
        assert!(outcome.segments().is_empty());
    }
}
