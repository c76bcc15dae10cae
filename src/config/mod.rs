use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batch::Collection;
use crate::HarvestError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Caption fetching settings
    pub fetch: FetchConfig,

    /// External tool settings
    pub tools: ToolsConfig,

    /// Script scorer settings
    pub scorer: ScorerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Caption languages in order of preference
    pub languages: Vec<String>,

    /// Pause between two videos, in seconds
    pub delay_seconds: f64,

    /// Root directory of the written artifacts
    pub output_dir: PathBuf,

    /// File name prefix of the batch artifacts
    pub prefix: String,

    /// Videos taken from each channel
    pub max_items_per_collection: usize,

    /// Channels harvested by `harvester channels` when none are given
    pub collections: Vec<Collection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Give up on a channel listing after this many seconds
    pub listing_timeout_secs: u64,

    /// Timeout of a caption download
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Where the JSON quality report is written
    pub report_path: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            languages: vec!["ja".to_string()],
            delay_seconds: 1.0,
            output_dir: PathBuf::from("./transcripts"),
            prefix: "transcripts".to_string(),
            max_items_per_collection: 10,
            collections: Vec::new(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            listing_timeout_secs: 120,
            http_timeout_secs: 30,
        }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("quality_report.json"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            tools: ToolsConfig::default(),
            scorer: ScorerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, the working directory or the
    /// user config directory. Defaults are written to the latter when nothing exists.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let local = PathBuf::from("harvester.yaml");
        if local.exists() {
            return Self::load_from(&local);
        }

        let user_path = Self::user_config_path()?;
        if user_path.exists() {
            return Self::load_from(&user_path);
        }

        let config = Self::default();
        if let Err(e) = config.save(&user_path).await {
            tracing::warn!("Could not write default config: {:#}", e);
        }
        Ok(config)
    }

    /// Load and validate one YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the per-user configuration file path
    pub fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-harvester").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if Duration::try_from_secs_f64(self.fetch.delay_seconds).is_err() {
            return Err(HarvestError::InvalidConfig(format!(
                "delay_seconds must be a non-negative number of seconds, got {}",
                self.fetch.delay_seconds
            ))
            .into());
        }

        if self.fetch.languages.is_empty() {
            return Err(
                HarvestError::InvalidConfig("at least one caption language is required".into())
                    .into(),
            );
        }

        if self.fetch.prefix.trim().is_empty() {
            return Err(HarvestError::InvalidConfig("prefix must not be empty".into()).into());
        }

        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.fetch.delay_seconds)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.listing_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.http_timeout_secs)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Languages: {}", self.fetch.languages.join(", "));
        println!("  Delay: {}s", self.fetch.delay_seconds);
        println!("  Output Dir: {}", self.fetch.output_dir.display());
        println!("  Prefix: {}", self.fetch.prefix);
        println!("  Videos per Channel: {}", self.fetch.max_items_per_collection);
        for collection in &self.fetch.collections {
            println!("  Channel: {} ({})", collection.label, collection.url);
        }
        println!("  yt-dlp: {}", self.tools.yt_dlp_path);
        println!("  Listing Timeout: {}s", self.tools.listing_timeout_secs);
        println!("  Report Path: {}", self.scorer.report_path.display());
    }
}
