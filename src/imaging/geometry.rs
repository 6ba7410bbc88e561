//! Whole-buffer reshaping.
//!
//! [`rotate90`], [`mirror`] and [`crop`] leave their source untouched and
//! return freshly allocated buffers. [`paste`] and [`blend`] write into the
//! destination in place, but only after the target region has been validated,
//! so a rejected call changes nothing.

use super::buffer::PixelBuffer;
use super::calculations::{blend_sample, mirrored_position, rotated_position};
use super::error::ImageError;
use super::params::Rect;

/// Quarter turn counter-clockwise. The result is `height x width`.
pub fn rotate90(image: &PixelBuffer) -> Result<PixelBuffer, ImageError> {
    let (width, height) = (image.width(), image.height());
    let mut rotated = image.derived(height, width)?;
    for y in 0..height {
        for x in 0..width {
            let (rx, ry) = rotated_position(x, y, width);
            rotated.set_pixel(rx, ry, image.get_pixel(x, y)?)?;
        }
    }
    Ok(rotated)
}

/// Left-right flip.
pub fn mirror(image: &PixelBuffer) -> Result<PixelBuffer, ImageError> {
    let (width, height) = (image.width(), image.height());
    let mut mirrored = image.derived(width, height)?;
    for y in 0..height {
        for x in 0..width {
            let (mx, my) = mirrored_position(x, y, width);
            mirrored.set_pixel(mx, my, image.get_pixel(x, y)?)?;
        }
    }
    Ok(mirrored)
}

/// Copy the `rect` region into a new buffer of the rect's size.
pub fn crop(image: &PixelBuffer, rect: Rect) -> Result<PixelBuffer, ImageError> {
    image.check_rect(rect)?;
    let mut cropped = image.derived(rect.width, rect.height)?;
    for j in 0..rect.height {
        for i in 0..rect.width {
            cropped.set_pixel(i, j, image.get_pixel(rect.x + i, rect.y + j)?)?;
        }
    }
    Ok(cropped)
}

fn placement(dst: &PixelBuffer, x: u32, y: u32, src: &PixelBuffer) -> Result<Rect, ImageError> {
    let rect = Rect::new(x, y, src.width(), src.height());
    dst.check_rect(rect)?;
    Ok(rect)
}

/// Overwrite the region of `dst` at `(x, y)` with `src`, sample for sample.
pub fn paste(dst: &mut PixelBuffer, x: u32, y: u32, src: &PixelBuffer) -> Result<(), ImageError> {
    let rect = placement(dst, x, y, src)?;
    for j in 0..rect.height {
        for i in 0..rect.width {
            dst.set_pixel(x + i, y + j, src.get_pixel(i, j)?)?;
        }
    }
    Ok(())
}

/// Mix `src` into the region of `dst` at `(x, y)`:
/// `dst = round(alpha * dst + (1 - alpha) * src)`, saturated at dst's maxval.
///
/// `alpha` is not validated; values outside `[0, 1]` extrapolate.
pub fn blend(
    dst: &mut PixelBuffer,
    x: u32,
    y: u32,
    src: &PixelBuffer,
    alpha: f64,
) -> Result<(), ImageError> {
    let rect = placement(dst, x, y, src)?;
    let ceiling = dst.maxval();
    for j in 0..rect.height {
        for i in 0..rect.width {
            let below = dst.get_pixel(x + i, y + j)?;
            let above = src.get_pixel(i, j)?;
            dst.set_pixel(x + i, y + j, blend_sample(below, above, alpha, ceiling))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::AccessCounter;
    use crate::test_helpers::{gray, ramp};

    const SCENARIO: [u8; 9] = [10, 20, 30, 40, 50, 60, 70, 80, 90];

    // =========================================================================
    // rotate90 / mirror
    // =========================================================================

    // Older tools built on the same model turned clockwise with
    // (x, y) -> (height-1-y, x). The worked 3x3 example below is a
    // counter-clockwise turn, and that is the direction kept here.
    #[test]
    fn rotate_scenario_turns_counter_clockwise() {
        let img = gray(3, 3, &SCENARIO);
        let rotated = rotate90(&img).unwrap();
        assert_eq!(rotated.samples(), &[30, 60, 90, 20, 50, 80, 10, 40, 70]);
        assert_eq!(img.samples(), &SCENARIO);
    }

    #[test]
    fn rotate_swaps_dimensions() {
        let img = gray(3, 2, &[1, 2, 3, 4, 5, 6]);
        let rotated = rotate90(&img).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (2, 3));
        // 1 2 3      3 6
        // 4 5 6  ->  2 5
        //            1 4
        assert_eq!(rotated.samples(), &[3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn four_rotations_are_identity() {
        let img = ramp(5, 3, 200);
        let mut turned = img.clone();
        for _ in 0..4 {
            turned = rotate90(&turned).unwrap();
        }
        assert_eq!(turned, img);
    }

    #[test]
    fn rotate_empty_image() {
        let img = PixelBuffer::new(0, 4, 255).unwrap();
        let rotated = rotate90(&img).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (4, 0));
    }

    #[test]
    fn mirror_flips_rows() {
        let img = gray(3, 2, &[1, 2, 3, 4, 5, 6]);
        let mirrored = mirror(&img).unwrap();
        assert_eq!(mirrored.samples(), &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn mirror_is_an_involution() {
        let img = ramp(7, 4, 255);
        assert_eq!(mirror(&mirror(&img).unwrap()).unwrap(), img);
    }

    #[test]
    fn derived_buffers_keep_maxval_and_counter() {
        let counter = AccessCounter::new();
        let img = PixelBuffer::from_samples(2, 1, 90, vec![1, 2])
            .unwrap()
            .with_counter(counter.clone());
        let mirrored = mirror(&img).unwrap();
        assert_eq!(mirrored.maxval(), 90);
        // 2 reads from the source, 2 stores into the result
        assert_eq!(counter.count(), 4);
    }

    // =========================================================================
    // crop
    // =========================================================================

    #[test]
    fn crop_copies_subrectangle() {
        let img = gray(3, 3, &SCENARIO);
        let cropped = crop(&img, Rect::new(1, 1, 2, 2)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (2, 2));
        assert_eq!(cropped.samples(), &[50, 60, 80, 90]);
    }

    #[test]
    fn crop_outside_is_invalid_region() {
        let img = gray(3, 3, &SCENARIO);
        let err = crop(&img, Rect::new(2, 0, 2, 1)).unwrap_err();
        assert!(matches!(
            err,
            ImageError::InvalidRegion {
                width: 3,
                height: 3,
                ..
            }
        ));
    }

    #[test]
    fn crop_empty_region_at_corner() {
        let img = gray(3, 3, &SCENARIO);
        let cropped = crop(&img, Rect::new(3, 3, 0, 0)).unwrap();
        assert!(cropped.is_empty());
    }

    // =========================================================================
    // paste / blend
    // =========================================================================

    #[test]
    fn paste_overwrites_region_in_place() {
        let mut dst = gray(3, 3, &SCENARIO);
        let src = gray(2, 1, &[1, 2]);
        paste(&mut dst, 1, 2, &src).unwrap();
        assert_eq!(dst.samples(), &[10, 20, 30, 40, 50, 60, 70, 1, 2]);
    }

    #[test]
    fn paste_rejects_overhang_without_writing() {
        let mut dst = gray(3, 3, &SCENARIO);
        let src = gray(2, 2, &[1, 2, 3, 4]);
        assert!(matches!(
            paste(&mut dst, 2, 0, &src),
            Err(ImageError::InvalidRegion { .. })
        ));
        assert_eq!(dst.samples(), &SCENARIO);
    }

    #[test]
    fn crop_then_paste_restores_original() {
        let img = ramp(6, 5, 255);
        let region = Rect::new(2, 1, 3, 3);
        let piece = crop(&img, region).unwrap();
        let mut dst = img.clone();
        negate_region(&mut dst, region);
        paste(&mut dst, region.x, region.y, &piece).unwrap();
        assert_eq!(dst, img);
    }

    fn negate_region(image: &mut PixelBuffer, rect: Rect) {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let s = image.get_pixel(x, y).unwrap();
                image.set_pixel(x, y, 255 - s).unwrap();
            }
        }
    }

    #[test]
    fn blend_mixes_with_alpha() {
        let mut dst = gray(2, 1, &[100, 200]);
        let src = gray(1, 1, &[0]);
        blend(&mut dst, 1, 0, &src, 0.25).unwrap();
        // 0.25 * 200 + 0.75 * 0 = 50
        assert_eq!(dst.samples(), &[100, 50]);
    }

    #[test]
    fn blend_alpha_one_keeps_destination() {
        let mut dst = gray(3, 3, &SCENARIO);
        let src = gray(3, 3, &[255; 9]);
        blend(&mut dst, 0, 0, &src, 1.0).unwrap();
        assert_eq!(dst.samples(), &SCENARIO);
    }

    #[test]
    fn blend_alpha_zero_equals_paste() {
        let mut blended = gray(3, 3, &SCENARIO);
        let mut pasted = blended.clone();
        let src = gray(2, 2, &[1, 2, 3, 4]);
        blend(&mut blended, 1, 1, &src, 0.0).unwrap();
        paste(&mut pasted, 1, 1, &src).unwrap();
        assert_eq!(blended, pasted);
    }

    #[test]
    fn blend_extrapolates_and_saturates_at_dst_maxval() {
        let mut dst = PixelBuffer::from_samples(2, 1, 100, vec![90, 10]).unwrap();
        let src = gray(2, 1, &[10, 90]);
        blend(&mut dst, 0, 0, &src, 1.5).unwrap();
        // 1.5 * 90 - 0.5 * 10 = 130 -> 100; 1.5 * 10 - 0.5 * 90 = -30 -> 0
        assert_eq!(dst.samples(), &[100, 0]);
    }

    #[test]
    fn blend_rejects_overhang() {
        let mut dst = gray(2, 2, &[0; 4]);
        let src = gray(1, 3, &[0; 3]);
        assert!(blend(&mut dst, 0, 0, &src, 0.5).is_err());
    }
}
