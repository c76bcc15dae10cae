use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::batch::Collection;

#[derive(Parser)]
#[command(
    name = "harvester",
    about = "Transcript Harvester - Batch-fetch YouTube captions and score scripts against a style rubric",
    version,
    long_about = "A CLI tool for collecting caption transcripts from YouTube videos and channels. Transcripts are saved per video, as a JSON manifest, a CSV summary and one combined text file. The score command checks a script against a fixed rubric of phrases, section markers, length and tone."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "HARVESTER_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Options shared by the fetching commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Caption languages in order of preference (comma separated)
    #[arg(short, long, value_delimiter = ',', value_name = "LANG")]
    pub languages: Vec<String>,

    /// Seconds to wait between two videos
    #[arg(short, long, value_name = "SECONDS")]
    pub delay: Option<f64>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File name prefix of the JSON/CSV/combined outputs
    #[arg(short, long, value_name = "PREFIX")]
    pub prefix: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch transcripts for individual video ids
    Fetch {
        /// Video ids
        #[arg(value_name = "VIDEO_ID")]
        ids: Vec<String>,

        /// File with one video id per line ('#' starts a comment)
        #[arg(long, value_name = "FILE")]
        ids_file: Option<PathBuf>,

        /// Label recorded as the channel of every video
        #[arg(long, default_value = "")]
        label: String,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Fetch transcripts for the most viewed videos of channels
    Channels {
        /// Channels as URL or LABEL=URL (defaults to the configured channels)
        #[arg(value_name = "CHANNEL")]
        collections: Vec<Collection>,

        /// Videos to take from each channel
        #[arg(short, long, value_name = "COUNT")]
        max_items: Option<usize>,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// List the most viewed videos of a channel
    List {
        /// Channel URL
        #[arg(value_name = "URL")]
        url: String,

        /// Videos to show
        #[arg(short, long, default_value = "10")]
        max_items: usize,
    },

    /// Score a script against the quality rubric
    Score {
        /// Script to score
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Show the effective configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}
