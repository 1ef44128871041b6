use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

pub const SELECTED: Rgb<u8> = Rgb([255, 255, 255]);
pub const UNSELECTED: Rgb<u8> = Rgb([0, 0, 0]);

/// A mask pixel selects its location only if all three channels are at full intensity.
///
/// Lossy mask files (e.g. JPEG) may have near-white pixels around the edge of the
/// selected region; those do not count.
pub fn is_selected(pixel: &Rgb<u8>) -> bool {
    pixel.0 == SELECTED.0
}

/// Number of selected pixels in a mask.
pub fn selected_count(mask: &RgbImage) -> usize {
    mask.pixels().filter(|p| is_selected(p)).count()
}

/// A filled circle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Circle {
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
}

impl Circle {
    pub fn new(center_x: i32, center_y: i32, radius: i32) -> Self {
        Circle {
            center_x,
            center_y,
            radius,
        }
    }

    /// A circle centered horizontally and shifted down by `dy` from the vertical center.
    ///
    /// The camera port window on the ISS is slightly off-center in the frame, which is
    /// why the masks used for the Phoenix images were placed 50 pixels below center
    /// with a radius of 1095.
    pub fn offset_from_center(width: u32, height: u32, dy: i32, radius: i32) -> Self {
        let center_y = (height / 2) as i64 + dy as i64;
        let center_y = center_y.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        Circle::new((width / 2) as i32, center_y, radius)
    }

    /// Whether `(x, y)` is inside the circle or on its boundary.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        // squared i32 differences can exceed i64
        let dx = x as i128 - self.center_x as i128;
        let dy = y as i128 - self.center_y as i128;
        let r = self.radius as i128;
        dx * dx + dy * dy <= r * r
    }
}

/// Builds a mask with a white disc on a black background.
pub fn circle_mask(width: u32, height: u32, circle: &Circle) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if circle.contains(x as i32, y as i32) {
            SELECTED
        } else {
            UNSELECTED
        }
    })
}

/// Largest coordinate or radius handed to the `imageproc` rasterizer, which adds them in i32.
const MAX_DRAWABLE: u32 = (i32::MAX / 4) as u32;

/// Paints a white disc over a copy of `image`, leaving everything else untouched.
///
/// This is how the original masks were produced from a sample frame. Only the white
/// disc matters to [`crate::ndvi`], but the disc edge is rasterized by `imageproc` and
/// can differ by a pixel from [`circle_mask`].
pub fn overlay_circle(image: &RgbImage, circle: &Circle) -> RgbImage {
    let mut out = image.clone();
    if circle.radius < 0 {
        return out;
    }

    let drawable = [circle.center_x, circle.center_y, circle.radius]
        .iter()
        .all(|v| v.unsigned_abs() <= MAX_DRAWABLE);
    if drawable {
        draw_filled_circle_mut(
            &mut out,
            (circle.center_x, circle.center_y),
            circle.radius,
            SELECTED,
        );
    } else {
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            if circle.contains(x as i32, y as i32) {
                *pixel = SELECTED;
            }
        }
    }
    out
}
