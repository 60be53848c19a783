use crate::detection::{BoundingBox, Detection};
use crate::errors::{ExtractError, Result};
use crate::traits::ObjectDetector;
use image::DynamicImage;

/// Test detector that reports the same detections for every image.
#[derive(Debug, Clone, Default)]
pub struct MockDetector {
    pub detections: Vec<Detection>,
}

impl MockDetector {
    pub const fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn detection(class_id: u32, class_name: &str, confidence: f32, xyxy: [f32; 4]) -> Detection {
        let [x1, y1, x2, y2] = xyxy;
        Detection {
            bounding_box: BoundingBox::new(x1, y1, x2, y2),
            class_id,
            class_name: class_name.to_string(),
            confidence,
        }
    }
}

impl ObjectDetector for MockDetector {
    fn detect(&self, _img: &DynamicImage) -> Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}

/// Test detector whose model invocation always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingDetector;

impl ObjectDetector for FailingDetector {
    fn detect(&self, _img: &DynamicImage) -> Result<Vec<Detection>> {
        Err(ExtractError::model(
            "mock inference",
            "detector is configured to fail",
        ))
    }
}

/// Three detections over a 64x48 image: a dog, a cat and a low-confidence person.
pub fn create_mock_detector() -> MockDetector {
    MockDetector::new(vec![
        MockDetector::detection(16, "dog", 0.92, [0.0, 0.0, 32.0, 24.0]),
        MockDetector::detection(15, "cat", 0.81, [16.0, 8.0, 48.0, 40.0]),
        MockDetector::detection(0, "person", 0.30, [40.0, 0.0, 64.0, 48.0]),
    ])
}
