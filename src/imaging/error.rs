//! Error type shared by every imaging operation.
//!
//! Each variant is one failure kind a caller may want to tell apart. System
//! failures (I/O, allocation) keep the underlying error as their `source` so
//! the OS error code survives to the caller.

use super::params::Rect;
use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimension { width: u64, height: u64 },
    #[error("Invalid maxval {0}: must be in 1..=255")]
    InvalidMaxval(u32),
    #[error("Pixel ({x}, {y}) is outside the {width}x{height} image")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("Region {rect} does not fit in the {width}x{height} image")]
    InvalidRegion { rect: Rect, width: u32, height: u32 },
    #[error("Malformed header: {reason}")]
    MalformedHeader {
        reason: String,
        #[source]
        source: Option<io::Error>,
    },
    #[error("Truncated pixel data: expected {expected} bytes, got {actual}")]
    TruncatedData {
        expected: usize,
        actual: usize,
        #[source]
        source: Option<io::Error>,
    },
    #[error("Open failed for {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Write failed: {0}")]
    WriteFailed(#[source] io::Error),
    #[error("Allocation of {bytes} bytes failed")]
    AllocationFailed {
        bytes: usize,
        #[source]
        source: TryReserveError,
    },
}

impl ImageError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
            source: None,
        }
    }

    /// The I/O error behind this failure, if one caused it.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::MalformedHeader { source, .. } | Self::TruncatedData { source, .. } => {
                source.as_ref()
            }
            Self::OpenFailed { source, .. } | Self::WriteFailed(source) => Some(source),
            _ => None,
        }
    }
}
