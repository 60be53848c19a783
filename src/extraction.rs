use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use crate::detection::{detect_file, Detection};
use crate::errors::{ExtractError, Result};
use crate::filter::FilterSpec;
use crate::traits::ObjectDetector;

/// Extraction of a single source image.
#[derive(Debug, Clone)]
pub struct ExtractionJob<'a> {
    pub source_dir: &'a Path,
    pub image_file_name: &'a str,
    pub filter: &'a FilterSpec,
}

/// Everything before the first `.` of the file name.
///
/// `my.photo.jpg` becomes `my`, not `my.photo`.
pub fn file_stem(image_file_name: &str) -> &str {
    image_file_name.split('.').next().unwrap_or(image_file_name)
}

/// `<output_dir>/<stem>/<index>_<class_name>_<file_name>`
pub fn artifact_path(
    output_dir: &Path,
    image_file_name: &str,
    index: usize,
    class_name: &str,
) -> PathBuf {
    output_dir
        .join(file_stem(image_file_name))
        .join(format!("{index}_{class_name}_{image_file_name}"))
}

/// Detections that pass `filter`, in detector order.
pub fn filter_detections<'d>(
    detections: &'d [Detection],
    filter: &FilterSpec,
) -> Vec<&'d Detection> {
    detections
        .iter()
        .filter(|detection| {
            let keep = filter.accepts(detection);
            if !keep {
                debug!(
                    class_id = detection.class_id,
                    confidence = detection.confidence,
                    "detection filtered out"
                );
            }
            keep
        })
        .collect()
}

/// Crops written for one source image, plus the ones that could not be.
#[derive(Debug, Default)]
pub struct ImageExtraction {
    /// Written paths in index order.
    pub artifacts: Vec<PathBuf>,
    pub write_failures: Vec<ExtractError>,
}

/// Run detection on one image and write a crop for every accepted detection.
///
/// Indices follow the accepted detections, so a crop that fails to write
/// leaves its index unused and the remaining crops are still written. The
/// per-image output directory is created only when at least one detection
/// survives the filter.
pub fn extract_objects_from_image<D: ObjectDetector + ?Sized>(
    detector: &D,
    job: &ExtractionJob<'_>,
    output_dir: &Path,
) -> Result<ImageExtraction> {
    let source_path = job.source_dir.join(job.image_file_name);
    let detected = detect_file(detector, &source_path)?;
    let accepted = filter_detections(&detected.detections, job.filter);

    let mut extraction = ImageExtraction::default();
    if accepted.is_empty() {
        debug!(path = %source_path.display(), "no objects passed the filter");
        return Ok(extraction);
    }

    let image_dir = output_dir.join(file_stem(job.image_file_name));
    create_dir(output_dir)?;
    create_dir(&image_dir)?;

    for (index, detection) in accepted.into_iter().enumerate() {
        let output_file = artifact_path(
            output_dir,
            job.image_file_name,
            index,
            &detection.class_name,
        );
        match write_crop(&detected.image, detection, &output_file) {
            Ok(()) => {
                debug!(path = %output_file.display(), class = %detection.class_name, "object extracted");
                extraction.artifacts.push(output_file);
            }
            Err(e) => {
                debug!(path = %output_file.display(), error = %e, "object not written");
                extraction.write_failures.push(e);
            }
        }
    }

    Ok(extraction)
}

/// Crop `detection` out of `image` and encode it to `output_file`.
///
/// A zero-area crop cannot be encoded and is reported without touching the
/// filesystem. A failed encode removes whatever was partially written.
fn write_crop(image: &DynamicImage, detection: &Detection, output_file: &Path) -> Result<()> {
    let (x, y, width, height) = detection.bounding_box.to_crop_rect();
    if width == 0 || height == 0 {
        return Err(ExtractError::EmptyArtifact {
            path: output_file.to_path_buf(),
            width,
            height,
        });
    }

    image
        .crop_imm(x, y, width, height)
        .save(output_file)
        .map_err(|e| {
            if let Err(remove_err) = fs::remove_file(output_file) {
                if remove_err.kind() != ErrorKind::NotFound {
                    debug!(path = %output_file.display(), error = %remove_err, "partial artifact left behind");
                }
            }
            ExtractError::ArtifactWrite {
                path: output_file.to_path_buf(),
                source: e,
            }
        })
}

/// Create-if-missing; an existing directory is not an error.
fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| ExtractError::FileSystem {
        path: path.to_path_buf(),
        operation: "output directory creation".to_string(),
        source: e,
    })
}
