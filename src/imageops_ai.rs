pub mod padding;

use image::{imageops, imageops::FilterType, Rgb, RgbImage};

pub use padding::Position;

/// Gray used by YOLO letterboxing.
pub const LETTERBOX_COLOR: Rgb<u8> = Rgb([114, 114, 114]);

/// Mapping between original image pixels and letterboxed model input pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    /// Map a point of the model input back to the original image.
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Resize `image` to fit a `size`x`size` square keeping its aspect ratio, then
/// pad the remainder with `LETTERBOX_COLOR`.
pub fn letterbox(image: &RgbImage, size: u32) -> (RgbImage, Letterbox) {
    let (width, height) = image.dimensions();
    let scale = (size as f32 / width.max(1) as f32).min(size as f32 / height.max(1) as f32);
    let new_width = ((width as f32 * scale).round() as u32).clamp(1, size);
    let new_height = ((height as f32 * scale).round() as u32).clamp(1, size);

    let resized = imageops::resize(image, new_width, new_height, FilterType::Triangle);
    let (canvas, (x, y)) = padding::padding(&resized, size, size, &Position::Center, LETTERBOX_COLOR)
        .unwrap_or_else(|| (resized.clone(), (0, 0)));

    (
        canvas,
        Letterbox {
            scale,
            pad_x: x as f32,
            pad_y: y as f32,
        },
    )
}
