//! Batch processing of PGM directories.
//!
//! Walks an input directory for `*.pgm` files, runs the same [`Step`] pipeline
//! over each one, and writes the results to the same relative path under an
//! output directory.
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── manifest.json          # Written by the binary from the returned manifest
//! ├── scans/
//! │   ├── 001.pgm
//! │   └── 002.pgm
//! └── cover.pgm
//! ```
//!
//! ## Failure Handling
//!
//! A file that cannot be decoded, transformed or written does not stop the
//! batch. Its error is logged, reported as [`ProcessEvent::ImageFailed`], and
//! recorded in the [`ProcessManifest`]. Only problems with the directories
//! themselves abort [`process`].
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel using [rayon](https://docs.rs/rayon) on
//! whatever pool the caller installed. Every worker charges the same
//! [`AccessCounter`], so the reported access count covers the whole batch.
//! The caller may attach that report to the manifest as `stats`.

use crate::imaging::{
    AccessCounter, ImageError, InstrReport, PixelBuffer, Step, load_counted, run_pipeline,
    save,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input directory not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Progress reported while a batch runs.
///
/// Events for different files may arrive in any order; `index` is the file's
/// 1-based position in the sorted input list.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    BatchStarted {
        total: usize,
        steps: Vec<String>,
    },
    ImageProcessed {
        index: usize,
        source: String,
        input: (u32, u32),
        output: (u32, u32),
    },
    ImageFailed {
        index: usize,
        source: String,
        error: String,
    },
}

/// Outcome for one input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedImage {
    /// Path relative to the input directory (same under the output directory)
    pub path: String,
    /// Source dimensions (width, height), when the file decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<(u32, u32)>,
    /// Written dimensions (width, height)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessedImage {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a batch run, serialized as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessManifest {
    /// Pipeline steps, as displayed
    pub steps: Vec<String>,
    /// Every input file in sorted order
    pub images: Vec<ProcessedImage>,
    /// Timing and access counts, when the run was instrumented
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<InstrReport>,
}

impl ProcessManifest {
    pub fn failures(&self) -> usize {
        self.images.iter().filter(|image| !image.succeeded()).count()
    }
}

fn is_pgm(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pgm"))
}

/// All `*.pgm` files under `input_dir`, relative to it, sorted by path.
pub fn discover_inputs(input_dir: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    if !input_dir.is_dir() {
        return Err(ProcessError::SourceNotFound(input_dir.to_path_buf()));
    }
    let mut inputs = Vec::new();
    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_pgm(entry.path()) {
            if let Ok(relative) = entry.path().strip_prefix(input_dir) {
                inputs.push(relative.to_path_buf());
            }
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Load, transform and save one file. Returns the (input, output) dimensions.
fn process_one(
    source: &Path,
    target: &Path,
    steps: &[Step],
    counter: &AccessCounter,
) -> Result<((u32, u32), (u32, u32)), ImageError> {
    let image = load_counted(source, counter.clone())?;
    let input = dims(&image);
    let result = run_pipeline(image, steps)?;
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(ImageError::WriteFailed)?;
    }
    save(&result, target)?;
    Ok((input, dims(&result)))
}

fn dims(image: &PixelBuffer) -> (u32, u32) {
    (image.width(), image.height())
}

/// Run `steps` over every PGM under `input_dir`, mirroring into `output_dir`.
///
/// Per-file failures are recorded in the returned manifest; the call itself
/// only fails when the input directory cannot be walked or the output
/// directory cannot be created.
pub fn process(
    input_dir: &Path,
    output_dir: &Path,
    steps: &[Step],
    counter: &AccessCounter,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessManifest, ProcessError> {
    let inputs = discover_inputs(input_dir)?;
    std::fs::create_dir_all(output_dir)?;

    let step_names: Vec<String> = steps.iter().map(ToString::to_string).collect();
    log::info!(
        "processing {} files from {} into {}",
        inputs.len(),
        input_dir.display(),
        output_dir.display()
    );
    if let Some(tx) = &progress {
        tx.send(ProcessEvent::BatchStarted {
            total: inputs.len(),
            steps: step_names.clone(),
        })
        .ok();
    }

    let images: Vec<ProcessedImage> = inputs
        .par_iter()
        .enumerate()
        .map_with(progress, |tx, (i, relative)| {
            let path = relative.to_string_lossy().into_owned();
            let outcome = process_one(
                &input_dir.join(relative),
                &output_dir.join(relative),
                steps,
                counter,
            );
            let (record, event) = match outcome {
                Ok((input, output)) => (
                    ProcessedImage {
                        path: path.clone(),
                        input: Some(input),
                        output: Some(output),
                        error: None,
                    },
                    ProcessEvent::ImageProcessed {
                        index: i + 1,
                        source: path,
                        input,
                        output,
                    },
                ),
                Err(e) => {
                    log::warn!("{path}: {e}");
                    (
                        ProcessedImage {
                            path: path.clone(),
                            input: None,
                            output: None,
                            error: Some(e.to_string()),
                        },
                        ProcessEvent::ImageFailed {
                            index: i + 1,
                            source: path,
                            error: e.to_string(),
                        },
                    )
                }
            };
            if let Some(tx) = tx {
                tx.send(event).ok();
            }
            record
        })
        .collect();

    Ok(ProcessManifest {
        steps: step_names,
        images,
        stats: None,
    })
}

/// Write `manifest` as pretty JSON to `output_dir/manifest.json`.
pub fn write_manifest(
    manifest: &ProcessManifest,
    output_dir: &Path,
) -> Result<PathBuf, ProcessError> {
    let path = output_dir.join("manifest.json");
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(&path, json)?;
    Ok(path)
}
