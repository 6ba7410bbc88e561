//! CLI output formatting.
//!
//! Every `format_*` function is pure and returns the lines to print, so the
//! layout can be tested without capturing stdout. The `print_*` wrappers just
//! write those lines.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! scan.pgm
//!     Size: 640x480
//!     Maxval: 255
//!     Range: 3..=251
//! ```
//!
//! ## Batch
//!
//! ```text
//! Processing 3 images: blur 3x3 → threshold 128
//!     001 a.pgm (640x480 → 640x480)
//!     003 sub/c.pgm
//!         Error: Truncated pixel data: expected 307200 bytes, got 12
//!     002 b.pgm (20x10 → 10x20)
//! 2 processed, 1 failed
//! ```
//!
//! ## Stats
//!
//! ```text
//! Stats
//!     time: 0.004113s
//!     pixmem: 921600
//! ```

use crate::imaging::{InstrReport, PixelBuffer};
use crate::process::{ProcessEvent, ProcessManifest};

/// Index + path line shared by batch events: `001 scans/a.pgm`.
fn image_line(index: usize, source: &str) -> String {
    format!("{:03} {}", index, source)
}

fn size(dimensions: (u32, u32)) -> String {
    format!("{}x{}", dimensions.0, dimensions.1)
}

// ============================================================================
// Single-image commands
// ============================================================================

/// Header summary and sample range of one image.
pub fn format_info(label: &str, image: &PixelBuffer) -> Vec<String> {
    let mut lines = vec![
        label.to_string(),
        format!("    Size: {}x{}", image.width(), image.height()),
        format!("    Maxval: {}", image.maxval()),
    ];
    if image.is_empty() {
        lines.push("    Range: empty".to_string());
    } else {
        let (min, max) = image.stats();
        lines.push(format!("    Range: {min}..={max}"));
    }
    lines
}

pub fn print_info(label: &str, image: &PixelBuffer) {
    for line in format_info(label, image) {
        println!("{}", line);
    }
}

/// Result of a pattern search.
pub fn format_locate(found: Option<(u32, u32)>) -> Vec<String> {
    match found {
        Some((x, y)) => vec![format!("Found at ({x}, {y})")],
        None => vec!["Not found".to_string()],
    }
}

pub fn print_locate(found: Option<(u32, u32)>) {
    for line in format_locate(found) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch processing
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { total, steps } => {
            let pipeline = if steps.is_empty() {
                "copy".to_string()
            } else {
                steps.join(" \u{2192} ")
            };
            vec![format!("Processing {} images: {}", total, pipeline)]
        }
        ProcessEvent::ImageProcessed {
            index,
            source,
            input,
            output,
        } => vec![format!(
            "    {} ({} \u{2192} {})",
            image_line(*index, source),
            size(*input),
            size(*output)
        )],
        ProcessEvent::ImageFailed {
            index,
            source,
            error,
        } => vec![
            format!("    {}", image_line(*index, source)),
            format!("        Error: {}", error),
        ],
    }
}

/// One-line tally after a batch finishes.
pub fn format_process_summary(manifest: &ProcessManifest) -> Vec<String> {
    let failed = manifest.failures();
    let processed = manifest.images.len() - failed;
    if failed == 0 {
        vec![format!("{} processed", processed)]
    } else {
        vec![format!("{} processed, {} failed", processed, failed)]
    }
}

pub fn print_process_summary(manifest: &ProcessManifest) {
    for line in format_process_summary(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Instrumentation
// ============================================================================

/// Elapsed time and every named counter.
pub fn format_report(report: &InstrReport) -> Vec<String> {
    let mut lines = vec![
        "Stats".to_string(),
        format!("    time: {:.6}s", report.elapsed.as_secs_f64()),
    ];
    for (name, count) in &report.counters {
        lines.push(format!("    {}: {}", name, count));
    }
    lines
}

/// Stats go to stderr so they never mix with piped command output.
pub fn print_report(report: &InstrReport) {
    for line in format_report(report) {
        eprintln!("{}", line);
    }
}
