use image::{imageops, GenericImageView, ImageBuffer, Pixel, Primitive};
use num_traits::AsPrimitive;

pub enum Position {
    TopLeft,
    Center,
}

pub fn to_position(
    width: u32,
    height: u32,
    pad_width: u32,
    pad_height: u32,
    position: &Position,
) -> Option<(i64, i64)> {
    if width > pad_width || height > pad_height {
        return None;
    }

    let (x, y) = match position {
        Position::TopLeft => (0, 0),
        Position::Center => ((pad_width - width) / 2, (pad_height - height) / 2),
    };

    Some((x.as_(), y.as_()))
}

pub fn padding<I, P, S>(
    image: &I,
    pad_width: u32,
    pad_height: u32,
    position: &Position,
    color: P,
) -> Option<(ImageBuffer<P, Vec<S>>, (i64, i64))>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    let (width, height) = image.dimensions();

    to_position(width, height, pad_width, pad_height, position).map(|(x, y)| {
        let mut canvas = ImageBuffer::from_pixel(pad_width, pad_height, color);
        imageops::overlay(&mut canvas, image, x, y);
        (canvas, (x, y))
    })
}
