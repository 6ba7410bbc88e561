//! Grayscale image processing in pure Rust, with no external codecs.
//!
//! | Operation | Function |
//! |---|---|
//! | **Load / save** | [`load`], [`save`] (raw `P5` PGM) |
//! | **Pointwise** | [`negate`], [`threshold`], [`brighten`], [`offset`] |
//! | **Geometric** | [`rotate90`], [`mirror`], [`crop`], [`paste`], [`blend`] |
//! | **Search** | [`matches_at`], [`locate`] |
//! | **Filter** | [`blur`], [`blur_in_place`] |
//!
//! The module is split into:
//! - **Buffer**: [`PixelBuffer`], the only owner of pixel storage
//! - **Calculations**: Pure functions for rounding, saturation and index math (unit testable)
//! - **Parameters**: [`Rect`] and [`Window`], describing where an operation acts
//! - **Instrumentation**: Optional [`AccessCounter`]s injected into buffers
//! - **Operations**: [`Step`] pipelines combining the transforms above
//!
//! Every failable call returns [`ImageError`]. Reshaping transforms and the
//! search never modify their inputs.

mod buffer;
mod calculations;
pub mod codec;
mod error;
mod filter;
mod geometry;
pub mod instrument;
mod matching;
pub mod operations;
mod params;
mod pointwise;

pub use buffer::{PIX_MAX, PixelBuffer, release};
pub use calculations::saturate;
pub use codec::{load, load_counted, save};
pub use error::ImageError;
pub use filter::{blur, blur_in_place};
pub use geometry::{blend, crop, mirror, paste, rotate90};
pub use instrument::{AccessCounter, InstrReport, Instrumentation};
pub use matching::{locate, matches_at};
pub use operations::{Step, plan_pipeline, run_pipeline};
pub use params::{Rect, Window};
pub use pointwise::{brighten, negate, offset, threshold};
