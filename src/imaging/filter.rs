//! Box blur over a clipped `(2dx+1) x (2dy+1)` window.
//!
//! Only in-bounds neighbors count: near borders and corners the window
//! shrinks and the mean is taken over fewer samples. Nothing is padded and
//! nothing wraps.
//!
//! The source is read exactly once, into a summed-area table, before any
//! output sample is produced. Output order therefore cannot influence the
//! result, whether the caller asks for a copy ([`blur`]) or an in-place
//! replacement ([`blur_in_place`]).

use super::buffer::{PixelBuffer, zeroed};
use super::calculations::{rounded_mean, window_span};
use super::error::ImageError;
use super::params::Window;

/// Prefix sums with a zero row and column in front:
/// `at(x, y)` is the sum of all samples strictly above and left of `(x, y)`.
struct SummedArea {
    stride: usize,
    sums: Vec<u64>,
}

impl SummedArea {
    /// All-zero table for a `width x height` image.
    fn zeros(width: u32, height: u32) -> Result<Self, ImageError> {
        let stride = width as usize + 1;
        let len = stride
            .checked_mul(height as usize + 1)
            .ok_or(ImageError::InvalidDimension {
                width: u64::from(width),
                height: u64::from(height),
            })?;
        Ok(Self {
            stride,
            sums: zeroed(len)?,
        })
    }

    fn build(image: &PixelBuffer) -> Result<Self, ImageError> {
        let Self { stride, mut sums } = Self::zeros(image.width(), image.height())?;
        for y in 0..image.height() {
            let mut row_sum = 0u64;
            for x in 0..image.width() {
                row_sum += u64::from(image.get_pixel(x, y)?);
                let (xi, yi) = (x as usize + 1, y as usize + 1);
                sums[yi * stride + xi] = sums[(yi - 1) * stride + xi] + row_sum;
            }
        }
        Ok(Self { stride, sums })
    }

    fn at(&self, x: u32, y: u32) -> u64 {
        self.sums[y as usize * self.stride + x as usize]
    }

    /// Sum over the inclusive rectangle `[x0, x1] x [y0, y1]`.
    fn region(&self, (x0, x1): (u32, u32), (y0, y1): (u32, u32)) -> u64 {
        self.at(x1 + 1, y1 + 1) + self.at(x0, y0) - self.at(x0, y1 + 1) - self.at(x1 + 1, y0)
    }
}

/// Blurred copy of `image`; the source is not modified.
pub fn blur(image: &PixelBuffer, window: Window) -> Result<PixelBuffer, ImageError> {
    log::debug!(
        "blur {}x{} with window dx={} dy={} ({} samples unclipped)",
        image.width(),
        image.height(),
        window.dx,
        window.dy,
        window.full_area()
    );
    let table = SummedArea::build(image)?;
    let mut blurred = image.derived(image.width(), image.height())?;
    let ceiling = u64::from(image.maxval());
    for y in 0..image.height() {
        let rows = window_span(y, window.dy, image.height());
        for x in 0..image.width() {
            let cols = window_span(x, window.dx, image.width());
            let count = u64::from(cols.1 - cols.0 + 1) * u64::from(rows.1 - rows.0 + 1);
            let mean = rounded_mean(table.region(cols, rows), count).min(ceiling);
            blurred.set_pixel(x, y, mean as u8)?;
        }
    }
    Ok(blurred)
}

/// Replace `image`'s samples with their blurred values.
pub fn blur_in_place(image: &mut PixelBuffer, window: Window) -> Result<(), ImageError> {
    let blurred = blur(image, window)?;
    image.replace_with(blurred);
    Ok(())
}
