//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `graymap.toml` files. Stock
//! defaults are the base layer; each config file given on the command line is
//! merged on top of the previous one, so later files only need the keys they
//! change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [pipeline]
//! steps = []                # Ordered transforms, e.g. ["blur", "threshold"]
//!
//! [threshold]
//! level = 128               # Samples below become black, the rest white
//!
//! [brighten]
//! factor = 1.0              # Multiplier; < 1 darkens
//!
//! [offset]
//! delta = 0                 # Signed amount added to every sample
//!
//! [blur]
//! dx = 1                    # Horizontal half-extent of the window
//! dy = 1                    # Vertical half-extent of the window
//!
//! [crop]
//! x = 0
//! y = 0
//! width = 0                 # Must be non-zero when "crop" is a step
//! height = 0
//!
//! [processing]
//! max_processes = 4         # Max parallel batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Rect;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `graymap.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Which transforms run, in order.
    pub pipeline: PipelineConfig,
    pub threshold: ThresholdConfig,
    pub brighten: BrightenConfig,
    pub offset: OffsetConfig,
    pub blur: BlurConfig,
    pub crop: CropConfig,
    /// Parallel batch settings.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let factor = self.brighten.factor;
        if !factor.is_finite() || factor < 0.0 {
            return Err(ConfigError::Validation(
                "brighten.factor must be a finite, non-negative number".into(),
            ));
        }
        if self.pipeline.steps.contains(&StepName::Crop) && self.crop.rect().is_empty() {
            return Err(ConfigError::Validation(
                "crop.width and crop.height must be non-zero when the pipeline crops".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Names of the transforms a pipeline may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepName {
    Negate,
    Threshold,
    Brighten,
    Offset,
    Rotate,
    Mirror,
    Crop,
    Blur,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub steps: Vec<StepName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Samples strictly below this level become black.
    pub level: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self { level: 128 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrightenConfig {
    pub factor: f64,
}

impl Default for BrightenConfig {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OffsetConfig {
    pub delta: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurConfig {
    pub dx: u32,
    pub dy: u32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self { dx: 1, dy: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropConfig {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Worker count for batch runs: all cores unless `max_processes` asks for
/// fewer. Requests above the core count are ignored.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// `ToolConfig::default()` as a TOML table: the bottom layer every config
/// file is merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ToolConfig::default())?)
}

/// Deep-merge `overlay` into `base`.
///
/// Tables merge per key and recurse; any other overlay value (arrays
/// included) replaces the base value outright. Base keys the overlay does not
/// mention survive.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a single config file on top of the stock defaults.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    load_layered(&[path])
}

/// Load several config files, each overriding the ones before it.
///
/// Missing files are skipped.
pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<ToolConfig, ConfigError> {
    let mut overlays = Vec::new();
    for path in paths {
        if let Some(value) = load_raw_config(path.as_ref())? {
            overlays.push(value);
        }
    }
    resolve_config(stock_defaults_value()?, overlays)
}

/// Returns a fully-commented stock `graymap.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# graymap configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Several files may be given with repeated --config flags; each one only
# needs the keys it wants to override. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Pipeline
# ---------------------------------------------------------------------------
[pipeline]
# Transforms applied in order. Available steps:
#   negate, threshold, brighten, offset, rotate, mirror, crop, blur
# Parameters for each step come from the sections below.
steps = []

# ---------------------------------------------------------------------------
# Pointwise transforms
# ---------------------------------------------------------------------------
[threshold]
# Samples below this level become black; all others become the image's maxval.
level = 128

[brighten]
# Multiplier applied to every sample, rounded and saturated at maxval.
# Values below 1.0 darken. Must be finite and non-negative.
factor = 1.0

[offset]
# Signed amount added to every sample, saturated into [0, maxval].
delta = 0

# ---------------------------------------------------------------------------
# Neighborhood filter
# ---------------------------------------------------------------------------
[blur]
# Half-extents of the averaging window; the window is (2dx+1) x (2dy+1),
# clipped at the image border.
dx = 1
dy = 1

# ---------------------------------------------------------------------------
# Geometry
# ---------------------------------------------------------------------------
[crop]
# Region kept by the "crop" step. Must fit inside the image being cropped.
x = 0
y = 0
width = 0
height = 0

# ---------------------------------------------------------------------------
# Batch processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `graymap batch`.
# Omit to use all CPU cores. Larger values are clamped to the core count.
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ToolConfig::default();
        assert!(config.pipeline.steps.is_empty());
        assert_eq!(config.threshold.level, 128);
        assert_eq!(config.brighten.factor, 1.0);
        assert_eq!(config.offset.delta, 0);
        assert_eq!((config.blur.dx, config.blur.dy), (1, 1));
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_pipeline_steps() {
        let toml_str = r#"
[pipeline]
steps = ["negate", "blur", "threshold", "crop"]

[crop]
width = 4
height = 2
"#;
        let config: ToolConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.pipeline.steps,
            vec![
                StepName::Negate,
                StepName::Blur,
                StepName::Threshold,
                StepName::Crop
            ]
        );
        assert_eq!(config.crop.rect(), Rect::new(0, 0, 4, 2));
    }

    #[test]
    fn unknown_step_rejected() {
        let toml_str = r#"
[pipeline]
steps = ["sharpen"]
"#;
        let result: Result<ToolConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    // =========================================================================
    // effective_threads tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"level = 128"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"level = 70"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("level").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[blur]
dx = 1
dy = 1
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[blur]
dy = 4
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let blur = merged.get("blur").unwrap();
        assert_eq!(blur.get("dy").unwrap().as_integer(), Some(4));
        // dx preserved from base
        assert_eq!(blur.get("dx").unwrap().as_integer(), Some(1));
    }

    #[test]
    fn merge_toml_replaces_arrays_wholesale() {
        let base: toml::Value = toml::from_str(
            r#"
[pipeline]
steps = ["negate", "blur"]
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[pipeline]
steps = ["mirror"]
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let steps = merged.get("pipeline").unwrap().get("steps").unwrap();
        assert_eq!(steps.as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[blur]
radius = 3
"#;
        let result: Result<ToolConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let toml_str = r#"
[sharpen]
amount = 1
"#;
        let result: Result<ToolConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("graymap.toml");
        fs::write(
            &path,
            r#"
[threshold]
levle = 90
"#,
        )
        .unwrap();

        assert!(load_config(&path).is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(ToolConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_negative_factor() {
        let mut config = ToolConfig::default();
        config.brighten.factor = -0.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_non_finite_factor() {
        let mut config = ToolConfig::default();
        config.brighten.factor = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_crop_step_needs_region() {
        let mut config = ToolConfig::default();
        config.pipeline.steps = vec![StepName::Crop];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.crop.width = 2;
        config.crop.height = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_zero_workers() {
        let mut config = ToolConfig::default();
        config.processing.max_processes = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn crop_section_ignored_without_crop_step() {
        let mut config = ToolConfig::default();
        config.pipeline.steps = vec![StepName::Negate];
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // Loading tests
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join("graymap.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_config_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("graymap.toml")).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn load_layered_later_files_win() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("base.toml");
        let local = tmp.path().join("local.toml");
        fs::write(
            &base,
            r#"
[pipeline]
steps = ["blur", "threshold"]

[threshold]
level = 100

[blur]
dx = 2
"#,
        )
        .unwrap();
        fs::write(
            &local,
            r#"
[threshold]
level = 40
"#,
        )
        .unwrap();

        let config = load_layered(&[&base, &local]).unwrap();
        assert_eq!(config.threshold.level, 40);
        assert_eq!(config.blur.dx, 2);
        assert_eq!(config.blur.dy, 1);
        assert_eq!(
            config.pipeline.steps,
            vec![StepName::Blur, StepName::Threshold]
        );
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[brighten]
factor = -2.0
"#,
        )
        .unwrap();
        let result = resolve_config(base, [overlay]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn resolve_config_out_of_range_level_is_parse_error() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[threshold]\nlevel = 300\n").unwrap();
        let result = resolve_config(base, [overlay]);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let content = stock_config_toml();
        let _: toml::Value = toml::from_str(content).expect("stock config must be valid TOML");
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ToolConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in [
            "[pipeline]",
            "[threshold]",
            "[brighten]",
            "[offset]",
            "[blur]",
            "[crop]",
            "[processing]",
        ] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        for key in ["pipeline", "threshold", "brighten", "blur", "crop", "processing"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }
}
