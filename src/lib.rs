//! Transcript Harvester - batch caption fetching and script quality scoring
//!
//! This library fetches caption transcripts for lists of YouTube videos (optionally
//! sourced from channel listings), persists them as per-video text files, a JSON
//! manifest, a CSV summary and a combined text file, and scores free-text scripts
//! against a fixed style rubric.

pub mod batch;
pub mod captions;
pub mod cli;
pub mod config;
pub mod listing;
pub mod output;
pub mod rubric;
pub mod utils;

pub use batch::{BatchOrchestrator, BatchOptions, Collection, ResultSet, RunSummary};
pub use captions::{
    CaptionResolver, CaptionSegment, CaptionService, CaptionTrack, FetchOutcome, FetchStatus,
};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use listing::{Item, ItemLister};
pub use output::ResultWriter;
pub use rubric::{score, RubricReport};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the harvester
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("Caption listing failed for {item_id}: {reason}")]
    ListingFailed { item_id: String, reason: String },

    #[error("No generated transcript found for any of the requested languages: {languages}")]
    NoGeneratedTrack { languages: String },

    #[error("Caption track {language} could not be fetched: HTTP {status}")]
    TrackFetchFailed { language: String, status: u16 },

    #[error("Invalid channel reference: {0}")]
    InvalidCollection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
