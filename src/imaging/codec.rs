//! Raw binary PGM (`P5`) reading and writing.
//!
//! ## Layout
//!
//! ```text
//! P5 <ws> [#comment\n]* <width> <ws> [#comment\n]* <height> <ws> [#comment\n]*
//! <maxval 1..=255> <exactly one ws byte> <width*height raw bytes, row-major>
//! ```
//!
//! Comments may appear in the three gaps between header tokens and run to the
//! end of their line. The writer never emits comments: it produces
//! `P5\n<w> <h>\n<maxval>\n` followed by the samples.
//!
//! The payload moves in bulk: [`decode`] hands the received bytes to
//! [`PixelBuffer::from_samples`] and [`encode`] writes the buffer's storage
//! directly, each charging the counter one access per sample instead of going
//! through `get_pixel`/`set_pixel`.
//!
//! Writes are not atomic. A failed [`save`] can leave a partial file behind,
//! and cleaning it up is the caller's job.

use super::buffer::{PixelBuffer, sample_count};
use super::error::ImageError;
use super::instrument::AccessCounter;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 2] = b"P5";

/// Header fields parsed ahead of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub maxval: u8,
}

/// Byte-at-a-time scanner over the header region of a stream.
struct HeaderScanner<'a, R> {
    reader: &'a mut R,
}

impl<'a, R: BufRead> HeaderScanner<'a, R> {
    fn peek(&mut self) -> Result<Option<u8>, ImageError> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(ImageError::MalformedHeader {
                        reason: "read failed".into(),
                        source: Some(e),
                    });
                }
            }
        }
    }

    fn bump(&mut self) {
        self.reader.consume(1);
    }

    fn expect_magic(&mut self) -> Result<(), ImageError> {
        for &expected in MAGIC {
            match self.peek()? {
                Some(b) if b == expected => self.bump(),
                _ => return Err(ImageError::malformed("invalid file format (expected P5)")),
            }
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<usize, ImageError> {
        let mut skipped = 0;
        while let Some(b) = self.peek()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.bump();
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Consume one `#` comment through its terminating newline.
    fn skip_comment(&mut self) -> Result<(), ImageError> {
        self.bump();
        loop {
            match self.peek()? {
                Some(b'\n') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => self.bump(),
                None => return Err(ImageError::malformed("unterminated comment")),
            }
        }
    }

    /// Separator between header tokens: at least one whitespace byte, then
    /// any mix of whitespace and comment lines.
    fn gap(&mut self, after: &str) -> Result<(), ImageError> {
        if self.skip_whitespace()? == 0 {
            return Err(ImageError::malformed(format!("whitespace expected after {after}")));
        }
        loop {
            self.skip_whitespace()?;
            if self.peek()? == Some(b'#') {
                self.skip_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    fn decimal(&mut self, field: &str) -> Result<u32, ImageError> {
        match self.peek()? {
            Some(b'-') => return Err(ImageError::malformed(format!("negative {field}"))),
            Some(b) if b.is_ascii_digit() => {}
            Some(_) => return Err(ImageError::malformed(format!("invalid {field}"))),
            None => return Err(ImageError::malformed(format!("missing {field}"))),
        }
        let mut value: u32 = 0;
        while let Some(b) = self.peek()? {
            if !b.is_ascii_digit() {
                break;
            }
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u32::from(b - b'0')))
                .ok_or_else(|| ImageError::malformed(format!("{field} too large")))?;
            self.bump();
        }
        Ok(value)
    }
}

/// Parse the header, leaving `reader` positioned at the first payload byte.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<Header, ImageError> {
    let mut scan = HeaderScanner { reader };
    scan.expect_magic()?;
    scan.gap("magic")?;
    let width = scan.decimal("width")?;
    scan.gap("width")?;
    let height = scan.decimal("height")?;
    scan.gap("height")?;
    let maxval = scan.decimal("maxval")?;
    let maxval = u8::try_from(maxval)
        .ok()
        .filter(|&m| m > 0)
        .ok_or_else(|| ImageError::malformed(format!("invalid maxval {maxval}")))?;
    match scan.peek()? {
        Some(b) if b.is_ascii_whitespace() => scan.bump(),
        _ => return Err(ImageError::malformed("whitespace expected after maxval")),
    }
    Ok(Header {
        width,
        height,
        maxval,
    })
}

/// Decode a whole image from a stream.
///
/// The returned buffer carries `counter`, which is charged one access per
/// payload byte. On failure no buffer survives.
pub fn decode<R: BufRead>(
    reader: &mut R,
    counter: AccessCounter,
) -> Result<PixelBuffer, ImageError> {
    let header = read_header(reader)?;
    log::debug!(
        "P5 header: {}x{} maxval {}",
        header.width,
        header.height,
        header.maxval
    );
    let expected = sample_count(header.width, header.height)?;
    // Reserve without touching, so a header that overstates the payload costs
    // only the bytes that actually arrive.
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(expected)
        .map_err(|source| ImageError::AllocationFailed {
            bytes: expected,
            source,
        })?;
    if let Err(e) = reader.take(expected as u64).read_to_end(&mut pixels) {
        return Err(ImageError::TruncatedData {
            expected,
            actual: pixels.len(),
            source: Some(e),
        });
    }
    counter.record(expected as u64);
    if pixels.len() < expected {
        return Err(ImageError::TruncatedData {
            expected,
            actual: pixels.len(),
            source: None,
        });
    }
    Ok(PixelBuffer::from_samples(header.width, header.height, header.maxval, pixels)?
        .with_counter(counter))
}

/// Encode `image` as `P5` into a stream.
pub fn encode<W: Write>(image: &PixelBuffer, writer: &mut W) -> Result<(), ImageError> {
    write!(
        writer,
        "P5\n{} {}\n{}\n",
        image.width(),
        image.height(),
        image.maxval()
    )
    .map_err(ImageError::WriteFailed)?;
    image.counter().record(image.len() as u64);
    writer
        .write_all(image.raw())
        .map_err(ImageError::WriteFailed)?;
    writer.flush().map_err(ImageError::WriteFailed)
}

/// Load a PGM file with counting disabled.
pub fn load(path: &Path) -> Result<PixelBuffer, ImageError> {
    load_counted(path, AccessCounter::disabled())
}

/// Load a PGM file, attaching `counter` to the result.
pub fn load_counted(path: &Path, counter: AccessCounter) -> Result<PixelBuffer, ImageError> {
    let file = File::open(path).map_err(|source| ImageError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decode(&mut BufReader::new(file), counter)?;
    log::debug!("loaded {} ({} samples)", path.display(), image.len());
    Ok(image)
}

/// Save `image` to `path`, replacing any existing file.
pub fn save(image: &PixelBuffer, path: &Path) -> Result<(), ImageError> {
    let file = File::create(path).map_err(|source| ImageError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    encode(image, &mut BufWriter::new(file))?;
    log::debug!("saved {}", path.display());
    Ok(())
}
