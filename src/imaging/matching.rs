//! Exact sub-image search.
//!
//! [`locate`] is a plain exhaustive scan: every anchor, row-major, full
//! comparison until the first mismatch. Worst case is
//! `O(W1 * H1 * W2 * H2)`. Skip tables or hashing would speed it up but must
//! keep first-match-in-scan-order semantics to be a drop-in.

use super::buffer::PixelBuffer;
use super::error::ImageError;

/// Whether `needle` appears in `haystack` with its top-left corner at
/// `(x, y)`.
///
/// Only the anchor is validated up front. A needle that overhangs the
/// haystack reports [`ImageError::OutOfBounds`] as soon as the comparison
/// reaches the overhang, unless a mismatch is found first.
pub fn matches_at(
    haystack: &PixelBuffer,
    x: u32,
    y: u32,
    needle: &PixelBuffer,
) -> Result<bool, ImageError> {
    if !haystack.valid_pos(x, y) {
        return Err(ImageError::OutOfBounds {
            x,
            y,
            width: haystack.width(),
            height: haystack.height(),
        });
    }
    for j in 0..needle.height() {
        for i in 0..needle.width() {
            // saturated coordinates are always out of bounds
            let (hx, hy) = (x.saturating_add(i), y.saturating_add(j));
            if haystack.get_pixel(hx, hy)? != needle.get_pixel(i, j)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// First anchor, scanning rows top to bottom and each row left to right,
/// where `needle` matches `haystack` exactly.
pub fn locate(
    haystack: &PixelBuffer,
    needle: &PixelBuffer,
) -> Result<Option<(u32, u32)>, ImageError> {
    if haystack.is_empty()
        || needle.width() > haystack.width()
        || needle.height() > haystack.height()
    {
        return Ok(None);
    }
    let last_x = haystack.width() - needle.width();
    let last_y = haystack.height() - needle.height();
    for y in 0..=last_y {
        for x in 0..=last_x {
            if matches_at(haystack, x, y, needle)? {
                log::debug!(
                    "{}x{} needle found at ({x}, {y})",
                    needle.width(),
                    needle.height()
                );
                return Ok(Some((x, y)));
            }
        }
    }
    Ok(None)
}
