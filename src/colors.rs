use image::Rgba;
use num_traits::clamp;
use palette::{Mix, Srgb};

/// A continuous, deterministic mapping from a scalar to a color.
///
/// Implementations clamp their input to `[0, 1]`, so any value above `1` yields the
/// endpoint color of the ramp. `NaN` is treated as `0`.
pub trait ColorRamp {
    fn color_at(&self, value: f64) -> Srgb<f64>;
}

/// Sampled stops of the viridis colormap at `0, 1/8, .., 1`.
const VIRIDIS_STOPS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 45, 123],
    [59, 82, 139],
    [44, 114, 142],
    [33, 145, 140],
    [40, 174, 128],
    [94, 201, 98],
    [173, 220, 48],
    [253, 231, 37],
];

/// The perceptual viridis gradient (dark purple → teal → yellow).
///
/// Colors between stops are linearly interpolated on the encoded sRGB components.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viridis;

impl ColorRamp for Viridis {
    fn color_at(&self, value: f64) -> Srgb<f64> {
        interpolate_stops(&VIRIDIS_STOPS, value)
    }
}

fn interpolate_stops(stops: &[[u8; 3]], value: f64) -> Srgb<f64> {
    let value = if value.is_nan() {
        0.0
    } else {
        clamp(value, 0.0, 1.0)
    };

    let segments = stops.len() - 1;
    let position = value * segments as f64;
    let lower = (position.floor() as usize).min(segments - 1);
    let factor = position - lower as f64;

    stop_color(stops[lower]).mix(stop_color(stops[lower + 1]), factor)
}

fn stop_color([r, g, b]: [u8; 3]) -> Srgb<f64> {
    Srgb::new(r, g, b).into_format()
}

/// Converts a ramp color into an opaque 8-bit pixel.
///
/// Each component is multiplied by 255 and rounded half away from zero.
pub fn to_rgba8(color: Srgb<f64>) -> Rgba<u8> {
    let channel = |c: f64| clamp((c * 255.0).round(), 0.0, 255.0) as u8;
    Rgba([
        channel(color.red),
        channel(color.green),
        channel(color.blue),
        255,
    ])
}
