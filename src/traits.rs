use crate::detection::Detection;
use crate::errors::Result;
use image::DynamicImage;

/// Object detection capability injected into the extractor.
///
/// Implementations load their model once and are shared by every image of a
/// run, possibly across threads.
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in a decoded image.
    ///
    /// Boxes are in pixel coordinates of `img`. The returned order is the
    /// model's native order and must be stable for a given input.
    fn detect(&self, img: &DynamicImage) -> Result<Vec<Detection>>;
}

impl<D: ObjectDetector + ?Sized> ObjectDetector for &D {
    fn detect(&self, img: &DynamicImage) -> Result<Vec<Detection>> {
        (**self).detect(img)
    }
}
