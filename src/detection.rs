use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use crate::errors::{ExtractError, Result};
use crate::traits::ObjectDetector;

/// Axis-aligned box in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &Self) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Integer crop rectangle `(x, y, width, height)`.
    ///
    /// Coordinates are truncated toward zero and the rectangle is half-open on
    /// the max edges. A degenerate box yields a zero width or height.
    pub fn to_crop_rect(&self) -> (u32, u32, u32, u32) {
        let x1 = self.x1 as u32;
        let y1 = self.y1 as u32;
        let x2 = self.x2 as u32;
        let y2 = self.y2 as u32;
        (x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }
}

/// One object reported by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub class_id: u32,
    pub class_name: String,
    pub confidence: f32,
}

/// A decoded source image together with its raw detections.
#[derive(Debug)]
pub struct DetectedImage {
    pub image: DynamicImage,
    pub detections: Vec<Detection>,
}

/// Decode `path` and run the detector over it.
///
/// Both decode and model failures surface as `ExtractError::Detection` so the
/// walker can isolate them to this image.
pub fn detect_file<D: ObjectDetector + ?Sized>(detector: &D, path: &Path) -> Result<DetectedImage> {
    let image = image::open(path).map_err(|e| ExtractError::Detection {
        path: path.to_path_buf(),
        operation: "image decode".to_string(),
        source: Box::new(e),
    })?;

    let detections = detector
        .detect(&image)
        .map_err(|e| ExtractError::Detection {
            path: path.to_path_buf(),
            operation: "object detection".to_string(),
            source: Box::new(e),
        })?;

    debug!(path = %path.display(), count = detections.len(), "raw detections");
    Ok(DetectedImage {
        image,
        detections,
    })
}
