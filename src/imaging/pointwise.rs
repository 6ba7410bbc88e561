//! Per-sample transforms, applied in place.
//!
//! Dimensions and maxval never change. Each sample is read once and stored
//! once.
//!
//! These whole-buffer passes go through `PixelBuffer::transform` rather than
//! `get_pixel`/`set_pixel`. The bulk path skips per-call bounds checks but
//! charges the attached counter the same two accesses per sample.

use super::buffer::{PIX_MAX, PixelBuffer};
use super::calculations::{offset_sample, saturate};

/// Photographic negative relative to the absolute ceiling: `s -> 255 - s`.
///
/// This deliberately ignores the buffer's maxval, so the operation is its
/// own inverse for every sample value.
pub fn negate(image: &mut PixelBuffer) {
    image.transform(|s| PIX_MAX - s);
}

/// Binarize: samples below `level` become 0, the rest become maxval.
pub fn threshold(image: &mut PixelBuffer, level: u8) {
    let white = image.maxval();
    image.transform(|s| if s < level { 0 } else { white });
}

/// Scale every sample by `factor`, rounding and saturating at maxval.
///
/// Factors below 1 darken. A factor of 0 produces a black image.
pub fn brighten(image: &mut PixelBuffer, factor: f64) {
    let ceiling = image.maxval();
    image.transform(|s| saturate(f64::from(s) * factor, ceiling));
}

/// Add `delta` to every sample, saturating into `[0, maxval]`.
pub fn offset(image: &mut PixelBuffer, delta: i32) {
    let ceiling = image.maxval();
    image.transform(|s| offset_sample(s, delta, ceiling));
}
