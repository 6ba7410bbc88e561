//! The owned 8-bit pixel raster.
//!
//! Samples are stored row-major: row 0 first, left to right within a row.
//! Every read and write goes through a bounds-checked accessor; an invalid
//! position is reported as [`ImageError::OutOfBounds`], never clamped.

use super::error::ImageError;
use super::instrument::AccessCounter;
use super::params::Rect;

/// Absolute byte ceiling of the format. Negation is relative to this, not to
/// a buffer's own maxval.
pub const PIX_MAX: u8 = 255;

/// Dense grayscale raster with a per-image white level.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    maxval: u8,
    pixels: Vec<u8>,
    counter: AccessCounter,
}

/// Equality covers geometry, white level and samples. The attached counter
/// is instrumentation and does not take part.
impl PartialEq for PixelBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.maxval == other.maxval
            && self.pixels == other.pixels
    }
}

impl Eq for PixelBuffer {}

pub(crate) fn sample_count(width: u32, height: u32) -> Result<usize, ImageError> {
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .ok_or(ImageError::InvalidDimension {
            width: u64::from(width),
            height: u64::from(height),
        })
}

/// `len` default values, reserved fallibly so an oversized request comes
/// back as [`ImageError::AllocationFailed`] instead of aborting.
pub(crate) fn zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>, ImageError> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|source| ImageError::AllocationFailed {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
            source,
        })?;
    values.resize(len, T::default());
    Ok(values)
}

fn check_maxval(maxval: u8) -> Result<(), ImageError> {
    if maxval == 0 {
        return Err(ImageError::InvalidMaxval(0));
    }
    Ok(())
}

impl PixelBuffer {
    /// Allocate a `width x height` buffer with every sample black (0).
    pub fn new(width: u32, height: u32, maxval: u8) -> Result<Self, ImageError> {
        check_maxval(maxval)?;
        let pixels = zeroed(sample_count(width, height)?)?;
        Ok(Self {
            width,
            height,
            maxval,
            pixels,
            counter: AccessCounter::disabled(),
        })
    }

    /// Wrap existing row-major samples.
    ///
    /// Samples are not checked against `maxval`; keeping them in range is
    /// the producer's job.
    pub fn from_samples(
        width: u32,
        height: u32,
        maxval: u8,
        samples: Vec<u8>,
    ) -> Result<Self, ImageError> {
        check_maxval(maxval)?;
        if sample_count(width, height)? != samples.len() {
            return Err(ImageError::InvalidDimension {
                width: u64::from(width),
                height: u64::from(height),
            });
        }
        Ok(Self {
            width,
            height,
            maxval,
            pixels: samples,
            counter: AccessCounter::disabled(),
        })
    }

    /// Attach an access counter.
    pub fn with_counter(mut self, counter: AccessCounter) -> Self {
        self.counter = counter;
        self
    }

    pub fn counter(&self) -> &AccessCounter {
        &self.counter
    }

    /// A fresh black buffer sharing this buffer's maxval and counter.
    pub(crate) fn derived(&self, width: u32, height: u32) -> Result<Self, ImageError> {
        Ok(Self::new(width, height, self.maxval)?.with_counter(self.counter.clone()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn maxval(&self) -> u8 {
        self.maxval
    }

    /// Number of samples (`width * height`).
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Whether `(x, y)` addresses a pixel of this buffer.
    pub fn valid_pos(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Whether `rect` lies entirely inside this buffer.
    pub fn valid_rect(&self, rect: &Rect) -> bool {
        rect.fits_within(self.width, self.height)
    }

    pub(crate) fn check_rect(&self, rect: Rect) -> Result<(), ImageError> {
        if self.valid_rect(&rect) {
            Ok(())
        } else {
            Err(ImageError::InvalidRegion {
                rect,
                width: self.width,
                height: self.height,
            })
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Result<usize, ImageError> {
        if !self.valid_pos(x, y) {
            return Err(ImageError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let index = y as usize * self.width as usize + x as usize;
        debug_assert!(index < self.pixels.len());
        Ok(index)
    }

    /// Read the sample at `(x, y)`.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<u8, ImageError> {
        let index = self.index(x, y)?;
        self.counter.record(1);
        Ok(self.pixels[index])
    }

    /// Store `level` at `(x, y)`.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, level: u8) -> Result<(), ImageError> {
        let index = self.index(x, y)?;
        self.counter.record(1);
        self.pixels[index] = level;
        Ok(())
    }

    /// Smallest and largest sample, `(0, 0)` for an empty buffer.
    pub fn stats(&self) -> (u8, u8) {
        self.counter.record(self.pixels.len() as u64);
        let Some(&first) = self.pixels.first() else {
            return (0, 0);
        };
        self.pixels
            .iter()
            .fold((first, first), |(lo, hi), &s| (lo.min(s), hi.max(s)))
    }

    /// All samples in row-major order.
    pub fn samples(&self) -> &[u8] {
        self.counter.record(self.pixels.len() as u64);
        &self.pixels
    }

    /// Rewrite every sample in place: one read and one store per sample.
    pub(crate) fn transform(&mut self, mut f: impl FnMut(u8) -> u8) {
        self.counter.record(2 * self.pixels.len() as u64);
        for sample in &mut self.pixels {
            *sample = f(*sample);
        }
    }

    /// Raw storage for the codec, which accounts for the access itself.
    pub(crate) fn raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Replace this buffer's contents with `other`'s, keeping this buffer's
    /// counter.
    pub(crate) fn replace_with(&mut self, other: PixelBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.maxval = other.maxval;
        self.pixels = other.pixels;
    }
}

/// Drop the buffer held in `slot`, if any. Releasing an empty slot is a no-op.
pub fn release(slot: &mut Option<PixelBuffer>) {
    slot.take();
}
