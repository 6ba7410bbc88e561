//! Pure arithmetic behind the transforms.
//!
//! All functions here are pure and testable without any buffers.

/// Round `value` to the nearest integer and saturate it into `[0, ceiling]`.
///
/// Halves round away from zero. NaN saturates to 0.
///
/// # Examples
/// ```
/// # use graymap::imaging::saturate;
/// assert_eq!(saturate(12.5, 255), 13);
/// assert_eq!(saturate(300.0, 200), 200);
/// assert_eq!(saturate(-4.0, 255), 0);
/// ```
pub fn saturate(value: f64, ceiling: u8) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(ceiling)) as u8
}

/// Add a signed delta to a sample, saturating into `[0, ceiling]`.
pub fn offset_sample(sample: u8, delta: i32, ceiling: u8) -> u8 {
    let shifted = i64::from(sample) + i64::from(delta);
    shifted.clamp(0, i64::from(ceiling)) as u8
}

/// `alpha * below + (1 - alpha) * above`, rounded and saturated.
///
/// `alpha` is not range-checked: values outside `[0, 1]` extrapolate.
pub fn blend_sample(below: u8, above: u8, alpha: f64, ceiling: u8) -> u8 {
    saturate(
        alpha * f64::from(below) + (1.0 - alpha) * f64::from(above),
        ceiling,
    )
}

/// Mean of `count` samples summing to `sum`, rounded half up.
pub fn rounded_mean(sum: u64, count: u64) -> u64 {
    debug_assert!(count > 0);
    (sum + count / 2) / count
}

/// Inclusive span `[start, end]` of a window of half-extent `radius` around
/// `center`, clipped to `[0, len)`. `len` must be non-zero.
pub fn window_span(center: u32, radius: u32, len: u32) -> (u32, u32) {
    debug_assert!(center < len);
    let start = center.saturating_sub(radius);
    let end = center.saturating_add(radius).min(len - 1);
    (start, end)
}

/// Destination of `(x, y)` after a counter-clockwise quarter turn of an
/// image `width` columns wide.
pub fn rotated_position(x: u32, y: u32, width: u32) -> (u32, u32) {
    (y, width - 1 - x)
}

/// Destination of `(x, y)` after a horizontal flip.
pub fn mirrored_position(x: u32, y: u32, width: u32) -> (u32, u32) {
    (width - 1 - x, y)
}
