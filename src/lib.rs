pub mod config;
pub mod detection;
pub mod errors;
pub mod extraction;
pub mod filter;
pub mod imageops_ai;
pub mod model;
pub mod progress_tracker;
pub mod traits;

pub mod mocks;

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

pub use config::{Config, ExtractionConfig};
pub use detection::{BoundingBox, DetectedImage, Detection};
pub use errors::{ExtractError, Result};
pub use extraction::{extract_objects_from_image, ExtractionJob, ImageExtraction};
pub use filter::FilterSpec;
pub use model::YoloModel;
pub use progress_tracker::{ExtractionReport, ImageFailure};
pub use traits::ObjectDetector;

/// Case-sensitive suffixes of the files that get processed.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = [".jpg", ".png", ".jpeg"];

pub fn is_supported_image_name(file_name: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|extension| file_name.ends_with(extension))
}

/// List the supported image file names directly inside `input_dir`.
///
/// Subdirectories are not descended. Fails when the directory is missing,
/// empty, or holds nothing with a supported extension.
pub fn scan_directory(input_dir: &Path) -> Result<Vec<String>> {
    if !input_dir.is_dir() {
        return Err(ExtractError::DirectoryNotFound {
            path: input_dir.to_path_buf(),
        });
    }

    let mut entry_count = 0;
    let mut image_names = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ExtractError::FileSystem {
            path: input_dir.to_path_buf(),
            operation: "directory listing".to_string(),
            source: e.into(),
        })?;
        entry_count += 1;

        match entry.file_name().to_str() {
            Some(name) if is_supported_image_name(name) => image_names.push(name.to_string()),
            _ => {}
        }
    }

    if entry_count == 0 {
        return Err(ExtractError::NoImagesFound {
            path: input_dir.to_path_buf(),
        });
    }
    if image_names.is_empty() {
        return Err(ExtractError::NoSupportedImagesFound {
            path: input_dir.to_path_buf(),
        });
    }
    Ok(image_names)
}

/// Runs the extraction engine over every supported image of a directory.
pub struct ObjectExtractor<D: ObjectDetector> {
    detector: D,
    config: ExtractionConfig,
    filter: FilterSpec,
}

impl<D: ObjectDetector> ObjectExtractor<D> {
    pub const fn new(detector: D, config: ExtractionConfig, filter: FilterSpec) -> Self {
        Self {
            detector,
            config,
            filter,
        }
    }

    pub fn process_directory(&self) -> Result<ExtractionReport> {
        let image_names = scan_directory(&self.config.input_dir)?;
        Ok(self.process_images(&image_names))
    }

    /// Extract every named image of the input directory.
    ///
    /// Images run in parallel and a failing image never stops its siblings.
    /// Failures are collected in the report and logged once the progress bar
    /// is cleared.
    pub fn process_images(&self, image_names: &[String]) -> ExtractionReport {
        let progress_bar = progress_tracker::progress_bar(image_names.len());

        let outcomes: Vec<_> = image_names
            .par_iter()
            .progress_with(progress_bar.clone())
            .map(|image_file_name| {
                (
                    self.config.input_dir.join(image_file_name),
                    self.process_single_image(image_file_name),
                )
            })
            .collect();
        progress_bar.finish_and_clear();

        let mut report = ExtractionReport::default();
        for (path, outcome) in outcomes {
            match &outcome {
                Ok(extraction) => {
                    for e in &extraction.write_failures {
                        warn!(path = %path.display(), error = %e, "skipping object");
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping image"),
            }
            report.record(path, outcome);
        }
        info!(
            processed = report.processed,
            failed = report.failures.len(),
            unwritten = report.artifact_failures.len(),
            artifacts = report.artifacts.len(),
            "extraction finished"
        );
        report
    }

    pub fn process_single_image(&self, image_file_name: &str) -> Result<ImageExtraction> {
        let job = ExtractionJob {
            source_dir: &self.config.input_dir,
            image_file_name,
            filter: &self.filter,
        };
        extract_objects_from_image(&self.detector, &job, &self.config.output_dir)
    }
}

/// Validate raw filter inputs, then extract objects from every supported
/// image in `config.input_dir`.
pub fn extract_objects_from_images_in_dir<D: ObjectDetector>(
    detector: D,
    config: ExtractionConfig,
    confidence: Option<f32>,
    classes: Option<&str>,
) -> Result<ExtractionReport> {
    let filter = FilterSpec::from_args(confidence, classes)?;
    ObjectExtractor::new(detector, config, filter).process_directory()
}
