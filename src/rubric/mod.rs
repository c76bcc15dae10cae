//! Script quality rubric.
//!
//! Scores a script on six independent checks (three phrase sets, the section
//! markers, character count and sentence-ending tone), each in `[0, 100]`, and
//! averages them into a total. Everything here is a pure function of the text.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub mod report;

pub use report::{render, save_json};

pub const REQUIRED_PHRASES: &[&str] = &[
    "偶然ではありません",
    "3万人に1人",
    "上位3%",
    "恐れることはありません",
    "一人ではありません",
    "プレアデス",
    "銀河連邦",
    "5次元",
    "3次元",
    "覚醒",
    "チャンネル登録",
    "コメント",
    "高評価",
];

pub const SYMPTOM_KEYWORDS: &[&str] = &["ゾロ目", "夜中", "目覚め", "不安", "孤独", "違和感"];

pub const ENDING_PHRASES: &[&str] = &["ノア", "愛と祝福", "また明日", "光"];

/// Section labels, in script order
pub const STRUCTURE_MARKERS: &[&str] = &[
    "オープニング",
    "問題提起",
    "宇宙的背景",
    "歴史的根拠",
    "変化の説明",
    "行動指針",
    "エンディング",
];

pub const TARGET_MIN_CHARS: usize = 6000;
pub const TARGET_MAX_CHARS: usize = 8000;

/// Share of tone endings (percent) that earns full marks is 100 / this
const TONE_MULTIPLIER: f64 = 3.0;

static NODESU: LazyLock<Regex> = LazyLock::new(|| tone_pattern("のです"));
static NANODESU: LazyLock<Regex> = LazyLock::new(|| tone_pattern("なのです"));
static KUDASAI: LazyLock<Regex> = LazyLock::new(|| tone_pattern("ください"));

fn tone_pattern(ending: &str) -> Regex {
    Regex::new(&format!("{}[。、]", regex::escape(ending))).expect("tone pattern is a valid regex")
}

/// Outcome of scoring one document
#[derive(Debug, Clone, Serialize)]
pub struct RubricReport {
    /// Document the text was read from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub checks: Vec<CategoryCheck>,
    pub total_score: f64,
}

impl RubricReport {
    pub fn check(&self, kind: CheckKind) -> Option<&CategoryCheck> {
        self.checks.iter().find(|c| c.kind == kind)
    }
}

/// Rubric categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    RequiredPhrases,
    SymptomKeywords,
    EndingPhrases,
    Structure,
    Length,
    Tone,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::RequiredPhrases => "Required phrases",
            CheckKind::SymptomKeywords => "Symptom keywords",
            CheckKind::EndingPhrases => "Ending phrases",
            CheckKind::Structure => "Script structure",
            CheckKind::Length => "Character count",
            CheckKind::Tone => "Tone (sentence endings)",
        }
    }
}

/// Score of one category plus its diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCheck {
    #[serde(rename = "category")]
    pub kind: CheckKind,
    pub score: f64,
    #[serde(flatten)]
    pub detail: CheckDetail,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CheckDetail {
    Coverage {
        found: usize,
        total: usize,
        details: Vec<PhraseHit>,
    },
    Length {
        char_count: usize,
        target_range: String,
        status: LengthStatus,
    },
    Tone {
        nodesu_count: usize,
        nanodesu_count: usize,
        kudasai_count: usize,
        total_sentences: usize,
        /// Tone endings per sentence, in percent
        ratio: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PhraseHit {
    pub phrase: String,
    pub found: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthStatus {
    Adequate,
    Insufficient,
    Excessive,
}

impl LengthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthStatus::Adequate => "adequate",
            LengthStatus::Insufficient => "insufficient",
            LengthStatus::Excessive => "excessive",
        }
    }
}

/// Run every check on `text`
pub fn score(text: &str) -> RubricReport {
    let checks = vec![
        check_coverage(text, REQUIRED_PHRASES, CheckKind::RequiredPhrases),
        check_coverage(text, SYMPTOM_KEYWORDS, CheckKind::SymptomKeywords),
        check_coverage(text, ENDING_PHRASES, CheckKind::EndingPhrases),
        check_coverage(text, STRUCTURE_MARKERS, CheckKind::Structure),
        check_length(text),
        check_tone(text),
    ];

    let total_score = checks.iter().map(|c| c.score).sum::<f64>() / checks.len() as f64;

    RubricReport {
        file: None,
        checks,
        total_score,
    }
}

/// Read a document and score it
pub fn score_file(path: &Path) -> Result<RubricReport> {
    let text = fs_err::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;

    Ok(RubricReport {
        file: Some(path.to_path_buf()),
        ..score(&text)
    })
}

/// Share of `phrases` occurring literally in `text`
pub fn check_coverage(text: &str, phrases: &[&str], kind: CheckKind) -> CategoryCheck {
    let details: Vec<PhraseHit> = phrases
        .iter()
        .map(|phrase| PhraseHit {
            phrase: phrase.to_string(),
            found: text.contains(phrase),
        })
        .collect();

    let found = details.iter().filter(|d| d.found).count();
    let score = if phrases.is_empty() {
        0.0
    } else {
        found as f64 / phrases.len() as f64 * 100.0
    };

    CategoryCheck {
        kind,
        score,
        detail: CheckDetail::Coverage {
            found,
            total: phrases.len(),
            details,
        },
    }
}

/// Character count against the target band
pub fn check_length(text: &str) -> CategoryCheck {
    let char_count = text.chars().count();
    let (min, max) = (TARGET_MIN_CHARS, TARGET_MAX_CHARS);

    let (score, status) = if char_count < min {
        (char_count as f64 / min as f64 * 100.0, LengthStatus::Insufficient)
    } else if char_count > max {
        (max as f64 / char_count as f64 * 100.0, LengthStatus::Excessive)
    } else {
        (100.0, LengthStatus::Adequate)
    };

    CategoryCheck {
        kind: CheckKind::Length,
        score,
        detail: CheckDetail::Length {
            char_count,
            target_range: format!("{}-{}", min, max),
            status,
        },
    }
}

/// Density of polite sentence endings.
///
/// "なのです" endings also count as "のです" endings.
pub fn check_tone(text: &str) -> CategoryCheck {
    let nodesu_count = NODESU.find_iter(text).count();
    let nanodesu_count = NANODESU.find_iter(text).count();
    let kudasai_count = KUDASAI.find_iter(text).count();
    let total_sentences = text.matches('。').count();

    let endings = nodesu_count + nanodesu_count + kudasai_count;
    let ratio = if total_sentences > 0 {
        endings as f64 / total_sentences as f64 * 100.0
    } else {
        0.0
    };

    CategoryCheck {
        kind: CheckKind::Tone,
        score: (ratio * TONE_MULTIPLIER).min(100.0),
        detail: CheckDetail::Tone {
            nodesu_count,
            nanodesu_count,
            kudasai_count,
            total_sentences,
            ratio,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every rubric phrase, each closed by a tone ending, padded to `len` chars
    fn full_marks_script(len: usize) -> String {
        let mut script = String::new();
        for phrase in REQUIRED_PHRASES
            .iter()
            .chain(SYMPTOM_KEYWORDS)
            .chain(ENDING_PHRASES)
            .chain(STRUCTURE_MARKERS)
        {
            script.push_str(phrase);
            script.push_str("なのです。");
        }
        let pad = len - script.chars().count();
        script.push_str(&"ー".repeat(pad));
        script
    }

    #[test]
    fn test_full_marks() {
        let script = full_marks_script(7000);
        assert_eq!(script.chars().count(), 7000);

        let report = score(&script);
        for check in &report.checks {
            assert_eq!(check.score, 100.0, "{:?}", check.kind);
        }
        assert_eq!(report.total_score, 100.0);
    }

    #[test]
    fn test_empty_document() {
        let report = score("");

        assert_eq!(report.check(CheckKind::Length).unwrap().score, 0.0);
        let tone = report.check(CheckKind::Tone).unwrap();
        assert_eq!(tone.score, 0.0);
        match &tone.detail {
            CheckDetail::Tone {
                total_sentences,
                ratio,
                ..
            } => {
                assert_eq!(*total_sentences, 0);
                assert_eq!(*ratio, 0.0);
            }
            other => panic!("unexpected detail {:?}", other),
        }
        assert_eq!(report.total_score, 0.0);
        assert_eq!(report.checks.len(), 6);
    }

    #[test]
    fn test_coverage_counts_literal_substrings() {
        let check = check_coverage("夜中に目覚めると不安", SYMPTOM_KEYWORDS, CheckKind::SymptomKeywords);
        assert_eq!(check.score, 50.0);
        match check.detail {
            CheckDetail::Coverage { found, total, details } => {
                assert_eq!(found, 3);
                assert_eq!(total, 6);
                assert!(details.iter().any(|d| d.phrase == "夜中" && d.found));
                assert!(details.iter().any(|d| d.phrase == "ゾロ目" && !d.found));
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_length_band() {
        let short = check_length(&"あ".repeat(3000));
        assert_eq!(short.score, 50.0);
        assert!(matches!(
            short.detail,
            CheckDetail::Length { status: LengthStatus::Insufficient, .. }
        ));

        let long = check_length(&"あ".repeat(10000));
        assert_eq!(long.score, 80.0);
        assert!(matches!(
            long.detail,
            CheckDetail::Length { status: LengthStatus::Excessive, .. }
        ));

        for len in [TARGET_MIN_CHARS, TARGET_MAX_CHARS] {
            assert_eq!(check_length(&"あ".repeat(len)).score, 100.0);
        }
    }

    #[test]
    fn test_tone_ratio() {
        // 10 sentences, 1 tone ending: 10% of sentences -> 30 points
        let mut text = "それでよいのです。".to_string();
        text.push_str(&"普通の文。".repeat(9));

        let tone = check_tone(&text);
        assert!((tone.score - 30.0).abs() < 1e-9);

        // commas count as endings but not as sentences
        let tone = check_tone("見てください、そして聞いてください。");
        assert_eq!(tone.score, 100.0);
        match tone.detail {
            CheckDetail::Tone { kudasai_count, total_sentences, .. } => {
                assert_eq!(kudasai_count, 2);
                assert_eq!(total_sentences, 1);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_nanodesu_counts_twice() {
        let tone = check_tone("大切なのです。");
        match tone.detail {
            CheckDetail::Tone { nodesu_count, nanodesu_count, .. } => {
                assert_eq!(nodesu_count, 1);
                assert_eq!(nanodesu_count, 1);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(score("プレアデスの光なのです。")).unwrap();

        assert!(json.get("file").is_none());
        assert_eq!(json["checks"][0]["category"], "required_phrases");
        assert_eq!(json["checks"][0]["total"], REQUIRED_PHRASES.len());
        assert_eq!(json["checks"][4]["status"], "insufficient");
        assert_eq!(json["checks"][5]["total_sentences"], 1);
    }

    #[test]
    fn test_score_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(score_file(&dir.path().join("missing.txt")).is_err());
    }
}
