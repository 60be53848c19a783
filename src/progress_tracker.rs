use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;

use crate::errors::ExtractError;
use crate::extraction::ImageExtraction;

/// Hidden at DEBUG level, where per-crop log lines would tear through the bar.
pub(crate) fn progress_bar(len: usize) -> ProgressBar {
    if tracing::enabled!(Level::DEBUG) {
        return ProgressBar::hidden();
    }

    let progress_bar = ProgressBar::new(len as u64);
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress_bar
}

/// An image, or one crop of it, that failed without stopping the run.
#[derive(Debug)]
pub struct ImageFailure {
    /// Source image path.
    pub path: PathBuf,
    pub error: ExtractError,
}

/// Outcome of one directory run.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Images extracted successfully, including those with no accepted objects.
    pub processed: usize,
    pub artifacts: Vec<PathBuf>,
    /// Images that produced nothing because decoding, detection or directory
    /// creation failed.
    pub failures: Vec<ImageFailure>,
    /// Single crops that could not be written; the rest of their image was.
    pub artifact_failures: Vec<ImageFailure>,
}

impl ExtractionReport {
    pub(crate) fn record(&mut self, path: PathBuf, outcome: Result<ImageExtraction, ExtractError>) {
        match outcome {
            Ok(extraction) => {
                self.processed += 1;
                self.artifacts.extend(extraction.artifacts);
                self.artifact_failures
                    .extend(extraction.write_failures.into_iter().map(|error| ImageFailure {
                        path: path.clone(),
                        error,
                    }));
            }
            Err(error) => self.failures.push(ImageFailure { path, error }),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.artifact_failures.is_empty()
    }
}
