//! # graymap
//!
//! 8-bit grayscale raster buffers, a raw PGM (`P5`) codec, and the classic
//! pixel transforms: negation, thresholding, brightening, quarter-turn
//! rotation, mirroring, cropping, pasting, alpha blending, exact sub-image
//! search and box blur.
//!
//! # Architecture
//!
//! ```text
//! file.pgm ──load──▶ PixelBuffer ──Step──▶ … ──Step──▶ PixelBuffer ──save──▶ out.pgm
//!                        │
//!                        └── AccessCounter (optional, shared)
//! ```
//!
//! The library operates on one [`imaging::PixelBuffer`] at a time. A
//! pipeline is just an ordered list of [`imaging::Step`]s, planned from a
//! `graymap.toml` file or built by hand, and [`process`] applies the same
//! pipeline to a whole directory tree in parallel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pixel buffers, the PGM codec, every transform, instrumentation |
//! | [`config`] | `graymap.toml` loading, layering, validation, stock config |
//! | [`process`] | Parallel batch runs over a directory, with progress events and a JSON manifest |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Checked Errors, Never Clamping
//!
//! Every coordinate and region is validated. An invalid position is an
//! [`imaging::ImageError::OutOfBounds`], an ill-fitting region an
//! [`imaging::ImageError::InvalidRegion`]; nothing is silently clamped and
//! no operation panics on bad input. Operations that write a region check the
//! whole region first, so a failed call leaves the destination untouched.
//!
//! ## Saturating Arithmetic
//!
//! Pointwise results are rounded and then clamped into `[0, maxval]` of the
//! image being written. Overflow never wraps.
//!
//! ## Opt-In Access Counting
//!
//! Buffers carry an [`imaging::AccessCounter`] that is disabled by default.
//! Injecting an enabled one (via [`imaging::Instrumentation`]) counts every
//! sample read and store without changing any result, which is how
//! `graymap --stats` reports the cost of a command.

pub mod config;
pub mod imaging;
pub mod output;
pub mod process;

#[cfg(test)]
pub(crate) mod test_helpers;
