//! Shared test utilities for the graymap test suite.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = gray(3, 1, &[0, 128, 255]);
//! let textured = ramp(8, 6, 255);
//! ```

use crate::imaging::PixelBuffer;

// =========================================================================
// Buffer builders
// =========================================================================

/// A `width x height` image at maxval 255 holding `samples` row-major.
/// Panics if the sample count does not match.
pub fn gray(width: u32, height: u32, samples: &[u8]) -> PixelBuffer {
    assert_eq!(
        samples.len(),
        width as usize * height as usize,
        "gray({width}, {height}) needs {} samples",
        width as usize * height as usize
    );
    PixelBuffer::from_samples(width, height, 255, samples.to_vec()).unwrap()
}

/// Deterministic non-repeating texture, every sample within `0..=maxval`.
///
/// Neighboring samples differ, so crops of it are unlikely to match anywhere
/// but their origin.
pub fn ramp(width: u32, height: u32, maxval: u8) -> PixelBuffer {
    let modulus = u32::from(maxval) + 1;
    let samples = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x * 31 + y * 17 + 7) % modulus) as u8))
        .collect();
    PixelBuffer::from_samples(width, height, maxval, samples).unwrap()
}
