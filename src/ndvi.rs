use image::{RgbImage, Rgba, RgbaImage};

use crate::{
    colors::{ColorRamp, Viridis, to_rgba8},
    errors::{NdviError, Result},
    mask::is_selected,
};

pub const AMPLIFICATION_EXPONENT: i32 = 7;
pub const AMPLIFICATION_GAIN: f64 = 48.0;

/// Output value for pixels outside the mask.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Normalized red/blue difference ratio, mapped from `[-1, 1]` into `[0, 1]`.
///
/// With the blue-filtered NoIR camera the red channel carries most of the near-infrared
/// signal, so this approximates NDVI. Black pixels (`r + b == 0`) yield `0`.
///
/// # Examples
///
/// ```
/// use ndvi_tools::ndvi::vegetation_index;
///
/// assert_eq!(vegetation_index(255, 0), 1.0);
/// assert_eq!(vegetation_index(0, 255), 0.0);
/// assert_eq!(vegetation_index(100, 100), 0.5);
/// assert_eq!(vegetation_index(0, 0), 0.0);
/// ```
pub fn vegetation_index(r: u8, b: u8) -> f64 {
    let r = f64::from(r);
    let b = f64::from(b);
    if r + b != 0.0 {
        ((r - b) / (r + b) + 1.0) / 2.0
    } else {
        0.0
    }
}

/// Amplification with the default exponent and gain.
///
/// The result is not clamped; anything above `1` saturates in the color ramp.
pub fn amplify(index: f64) -> f64 {
    index.powi(AMPLIFICATION_EXPONENT) * AMPLIFICATION_GAIN
}

/// Transformer progress, reported in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub rows_done: u32,
    pub rows_total: u32,
}

impl Progress {
    pub fn percent(&self) -> u32 {
        if self.rows_total == 0 {
            100
        } else {
            ((self.rows_done as u64 * 100) / self.rows_total as u64) as u32
        }
    }
}

/// Renders the vegetation index of the masked region of an image through a color ramp.
#[derive(Debug, Clone)]
pub struct NdviTransformer<C: ColorRamp> {
    ramp: C,
    exponent: i32,
    gain: f64,
}

impl Default for NdviTransformer<Viridis> {
    fn default() -> Self {
        NdviTransformer::new(Viridis)
    }
}

impl<C: ColorRamp> NdviTransformer<C> {
    pub fn new(ramp: C) -> Self {
        NdviTransformer {
            ramp,
            exponent: AMPLIFICATION_EXPONENT,
            gain: AMPLIFICATION_GAIN,
        }
    }

    pub fn with_exponent(mut self, exponent: i32) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn ramp(&self) -> &C {
        &self.ramp
    }

    pub fn amplify(&self, index: f64) -> f64 {
        index.powi(self.exponent) * self.gain
    }

    /// Color of a selected pixel with the given red and blue channels.
    pub fn pixel_color(&self, r: u8, b: u8) -> Rgba<u8> {
        let amplified = self.amplify(vegetation_index(r, b));
        to_rgba8(self.ramp.color_at(amplified))
    }

    /// Builds the output image for `source` restricted to the white pixels of `mask`.
    ///
    /// Neither input is modified. Pixels outside the mask are fully transparent.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the two images differ in size. This is checked
    /// before any pixel is processed.
    pub fn transform(&self, source: &RgbImage, mask: &RgbImage) -> Result<RgbaImage> {
        self.transform_with_progress(source, mask, 0, |_| {})
    }

    /// Like [`transform`](Self::transform), invoking `progress` after every `cadence`
    /// rows and once after the last row. A `cadence` of `0` disables reporting.
    pub fn transform_with_progress<F>(
        &self,
        source: &RgbImage,
        mask: &RgbImage,
        cadence: u32,
        mut progress: F,
    ) -> Result<RgbaImage>
    where
        F: FnMut(Progress),
    {
        if source.dimensions() != mask.dimensions() {
            return Err(NdviError::dimension_mismatch(
                source.dimensions(),
                mask.dimensions(),
            ));
        }

        let (width, height) = source.dimensions();
        let mut output = RgbaImage::from_pixel(width, height, TRANSPARENT);

        for y in 0..height {
            for x in 0..width {
                if is_selected(mask.get_pixel(x, y)) {
                    let [r, _, b] = source.get_pixel(x, y).0;
                    output.put_pixel(x, y, self.pixel_color(r, b));
                }
            }

            let rows_done = y + 1;
            if cadence > 0 && (rows_done % cadence == 0 || rows_done == height) {
                progress(Progress {
                    rows_done,
                    rows_total: height,
                });
            }
        }

        Ok(output)
    }
}
