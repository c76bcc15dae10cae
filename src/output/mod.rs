use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::captions::FetchOutcome;

pub mod formatters;

pub use formatters::*;

/// Paths of the batch-level artifacts written by `save_all`
#[derive(Debug, Clone)]
pub struct SavedArtifacts {
    pub manifest: PathBuf,
    pub summary: PathBuf,
    pub combined: PathBuf,
}

/// Writes transcripts under an output directory:
/// `individual/*.txt`, `{prefix}.json`, `{prefix}_summary.csv`, `{prefix}_combined.txt`
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
    prefix: String,
}

impl ResultWriter {
    /// Create the writer and its directory tree
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let writer = Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        };

        fs_err::create_dir_all(writer.individual_dir())
            .context("Failed to create output directory")?;

        Ok(writer)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn individual_dir(&self) -> PathBuf {
        self.output_dir.join("individual")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.prefix))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_summary.csv", self.prefix))
    }

    pub fn combined_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_combined.txt", self.prefix))
    }

    /// Save one successful transcript to its own file
    pub fn save_individual(&self, outcome: &FetchOutcome) -> Result<PathBuf> {
        if !outcome.is_success() {
            anyhow::bail!(
                "Refusing to save {} transcript for {}",
                outcome.status(),
                outcome.item_id()
            );
        }

        let path = self.individual_dir().join(individual_filename(outcome));
        fs_err::write(&path, format_individual(outcome))?;
        tracing::debug!("Saved transcript: {}", path.display());

        Ok(path)
    }

    /// Write manifest, summary and combined text.
    ///
    /// Every artifact is attempted; the first failure is returned afterwards.
    pub fn save_all(&self, outcomes: &[FetchOutcome]) -> Result<SavedArtifacts> {
        let artifacts = SavedArtifacts {
            manifest: self.manifest_path(),
            summary: self.summary_path(),
            combined: self.combined_path(),
        };

        let results = [
            format_manifest(outcomes).and_then(|json| write(&artifacts.manifest, json)),
            write(&artifacts.summary, format_summary_csv(outcomes)),
            write(&artifacts.combined, format_combined(outcomes)),
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                tracing::error!("{:#}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(artifacts),
        }
    }
}

fn write(path: &Path, content: String) -> Result<()> {
    fs_err::write(path, content)?;
    tracing::info!("Saved {}", path.display());
    Ok(())
}
