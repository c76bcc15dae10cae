use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{CaptionSegment, CaptionService, CaptionTrack};
use crate::listing::watch_url;
use crate::{HarvestError, Result};

/// Caption format requested from YouTube's timed-text endpoint
const CAPTION_EXT: &str = "json3";

/// YouTube caption service: track listing through yt-dlp, content over HTTP
pub struct YtDlpCaptionService {
    yt_dlp_path: String,
    http: reqwest::Client,
}

impl YtDlpCaptionService {
    pub fn new(yt_dlp_path: impl Into<String>, http_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            yt_dlp_path: yt_dlp_path.into(),
            http,
        })
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, item_id: &str) -> Result<Value> {
        let url = watch_url(item_id);
        tracing::debug!("Listing caption tracks for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--skip-download", "--no-playlist", url.as_str()])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(HarvestError::ListingFailed {
                item_id: item_id.to_string(),
                reason: error.trim().to_string(),
            }
            .into());
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .context("Failed to parse yt-dlp output")?;

        Ok(info)
    }
}

#[async_trait]
impl CaptionService for YtDlpCaptionService {
    async fn list_tracks(&self, item_id: &str) -> Result<Vec<CaptionTrack>> {
        let info = self.get_video_info(item_id).await?;
        Ok(tracks_from_info(&info))
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionSegment>> {
        let response = self
            .http
            .get(&track.url)
            .send()
            .await
            .with_context(|| format!("Failed to download {} captions", track.language_code))?;

        if !response.status().is_success() {
            return Err(HarvestError::TrackFetchFailed {
                language: track.language_code.clone(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .context("Failed to read caption content")?;

        parse_json3(&body)
    }
}

/// Collect caption tracks from yt-dlp's video info.
///
/// Manual tracks come before generated ones; within each group tracks are in
/// language-code order. Machine translations of generated tracks are skipped.
pub fn tracks_from_info(info: &Value) -> Vec<CaptionTrack> {
    let mut tracks = collect_tracks(&info["subtitles"], false);
    tracks.extend(collect_tracks(&info["automatic_captions"], true));
    tracks
}

fn collect_tracks(section: &Value, is_generated: bool) -> Vec<CaptionTrack> {
    let Some(languages) = section.as_object() else {
        return Vec::new();
    };

    let mut codes: Vec<&String> = languages.keys().collect();
    codes.sort();

    codes
        .into_iter()
        .filter_map(|code| {
            let formats = languages[code.as_str()].as_array()?;
            let format = formats
                .iter()
                .find(|f| f["ext"].as_str() == Some(CAPTION_EXT))?;
            let url = format["url"].as_str()?;

            if is_generated && url.contains("tlang=") {
                return None;
            }

            Some(CaptionTrack {
                language_code: code.clone(),
                language_name: format["name"].as_str().map(str::to_string),
                is_generated,
                url: url.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Turn a json3 caption document into ordered segments; events without text are dropped
pub fn parse_json3(body: &str) -> Result<Vec<CaptionSegment>> {
    let doc: Json3 = serde_json::from_str(body).context("Failed to parse json3 captions")?;

    let segments = doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(CaptionSegment::new(
                text,
                event.t_start_ms as f64 / 1000.0,
                event.d_duration_ms as f64 / 1000.0,
            ))
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tracks_from_info() {
        let info = json!({
            "id": "vid1",
            "subtitles": {
                "ja": [
                    {"ext": "vtt", "url": "https://example.com/ja.vtt"},
                    {"ext": "json3", "url": "https://example.com/ja.json3", "name": "Japanese"}
                ],
                "en": [{"ext": "json3", "url": "https://example.com/en.json3"}],
                "fr": [{"ext": "srv1", "url": "https://example.com/fr.srv1"}]
            },
            "automatic_captions": {
                "ja": [{"ext": "json3", "url": "https://example.com/auto-ja.json3"}],
                "de": [{"ext": "json3", "url": "https://example.com/auto.json3?tlang=de"}]
            }
        });

        let tracks = tracks_from_info(&info);
        let summary: Vec<(&str, bool)> = tracks
            .iter()
            .map(|t| (t.language_code.as_str(), t.is_generated))
            .collect();

        assert_eq!(summary, vec![("en", false), ("ja", false), ("ja", true)]);
        assert_eq!(tracks[1].language_name.as_deref(), Some("Japanese"));
        assert_eq!(tracks[1].url, "https://example.com/ja.json3");
    }

    #[test]
    fn test_tracks_from_info_without_captions() {
        let info = json!({"id": "vid1", "subtitles": {}, "automatic_captions": null});
        assert!(tracks_from_info(&info).is_empty());
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 120000, "id": 1},
                {"tStartMs": 1200, "dDurationMs": 2500, "segs": [{"utf8": "皆さん"}, {"utf8": "こんにちは"}]},
                {"tStartMs": 3700, "dDurationMs": 100, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 4000, "dDurationMs": 1800, "segs": [{"utf8": " ノアです "}]}
            ]
        }"#;

        let segments = parse_json3(body).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "皆さんこんにちは");
        assert_eq!(segments[0].start_offset, 1.2);
        assert_eq!(segments[0].duration, 2.5);
        assert_eq!(segments[1].text, "ノアです");
        assert_eq!(segments[1].start_offset, 4.0);
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(parse_json3("<transcript/>").is_err());
    }
}
