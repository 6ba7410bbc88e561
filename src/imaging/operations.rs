//! High-level pipelines.
//!
//! A [`Step`] names one transform together with its parameters. Pipelines
//! are planned from configuration by [`plan_pipeline`] and executed by
//! [`run_pipeline`], which threads one buffer through every step.

use super::error::ImageError;
use super::params::{Rect, Window};
use super::{
    PixelBuffer, blur_in_place, brighten, crop, mirror, negate, offset, rotate90, threshold,
};
use crate::config::{StepName, ToolConfig};
use std::fmt;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// One transform with its parameters bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Negate,
    Threshold(u8),
    Brighten(f64),
    Offset(i32),
    Rotate,
    Mirror,
    Crop(Rect),
    Blur(Window),
}

impl Step {
    /// Apply this step, consuming the input and returning the result.
    ///
    /// In-place transforms hand back the same allocation; reshaping ones
    /// return a new buffer and drop the old one.
    pub fn apply(&self, mut image: PixelBuffer) -> Result<PixelBuffer> {
        match *self {
            Step::Negate => negate(&mut image),
            Step::Threshold(level) => threshold(&mut image, level),
            Step::Brighten(factor) => brighten(&mut image, factor),
            Step::Offset(delta) => offset(&mut image, delta),
            Step::Rotate => return rotate90(&image),
            Step::Mirror => return mirror(&image),
            Step::Crop(rect) => return crop(&image, rect),
            Step::Blur(window) => blur_in_place(&mut image, window)?,
        }
        Ok(image)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Negate => write!(f, "negate"),
            Step::Threshold(level) => write!(f, "threshold {level}"),
            Step::Brighten(factor) => write!(f, "brighten x{factor}"),
            Step::Offset(delta) => write!(f, "offset {delta:+}"),
            Step::Rotate => write!(f, "rotate"),
            Step::Mirror => write!(f, "mirror"),
            Step::Crop(rect) => write!(f, "crop {rect}"),
            Step::Blur(w) => write!(
                f,
                "blur {}x{}",
                2 * u64::from(w.dx) + 1,
                2 * u64::from(w.dy) + 1
            ),
        }
    }
}

/// Turn a configuration into the ordered list of steps it describes.
pub fn plan_pipeline(config: &ToolConfig) -> Vec<Step> {
    config
        .pipeline
        .steps
        .iter()
        .map(|name| match name {
            StepName::Negate => Step::Negate,
            StepName::Threshold => Step::Threshold(config.threshold.level),
            StepName::Brighten => Step::Brighten(config.brighten.factor),
            StepName::Offset => Step::Offset(config.offset.delta),
            StepName::Rotate => Step::Rotate,
            StepName::Mirror => Step::Mirror,
            StepName::Crop => Step::Crop(config.crop.rect()),
            StepName::Blur => Step::Blur(Window::new(config.blur.dx, config.blur.dy)),
        })
        .collect()
}

/// Run `steps` in order over `image`.
pub fn run_pipeline(image: PixelBuffer, steps: &[Step]) -> Result<PixelBuffer> {
    steps.iter().try_fold(image, |image, step| {
        log::debug!("applying {step}");
        step.apply(image)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CropConfig, PipelineConfig};
    use crate::test_helpers::gray;

    const SCENARIO: [u8; 9] = [10, 20, 30, 40, 50, 60, 70, 80, 90];

    #[test]
    fn empty_pipeline_returns_input() {
        let img = gray(3, 3, &SCENARIO);
        assert_eq!(run_pipeline(img.clone(), &[]).unwrap(), img);
    }

    #[test]
    fn steps_run_in_order() {
        let img = gray(3, 3, &SCENARIO);
        let steps = [Step::Rotate, Step::Crop(Rect::new(0, 0, 3, 1))];
        let out = run_pipeline(img, &steps).unwrap();
        assert_eq!(out.samples(), &[30, 60, 90]);

        let img = gray(3, 3, &SCENARIO);
        let steps = [Step::Crop(Rect::new(0, 0, 3, 1)), Step::Rotate];
        let out = run_pipeline(img, &steps).unwrap();
        assert_eq!((out.width(), out.height()), (1, 3));
        assert_eq!(out.samples(), &[30, 20, 10]);
    }

    #[test]
    fn failing_step_stops_pipeline() {
        let img = gray(3, 3, &SCENARIO);
        let err = run_pipeline(img, &[Step::Negate, Step::Crop(Rect::new(2, 2, 2, 2))]);
        assert!(matches!(err, Err(ImageError::InvalidRegion { .. })));
    }

    #[test]
    fn plan_uses_section_parameters() {
        let config = ToolConfig {
            pipeline: PipelineConfig {
                steps: vec![StepName::Blur, StepName::Threshold, StepName::Crop],
            },
            crop: CropConfig {
                x: 1,
                y: 2,
                width: 3,
                height: 4,
            },
            ..ToolConfig::default()
        };
        assert_eq!(
            plan_pipeline(&config),
            vec![
                Step::Blur(Window::new(1, 1)),
                Step::Threshold(128),
                Step::Crop(Rect::new(1, 2, 3, 4)),
            ]
        );
    }

    #[test]
    fn default_config_plans_nothing() {
        assert!(plan_pipeline(&ToolConfig::default()).is_empty());
    }

    #[test]
    fn step_display() {
        assert_eq!(Step::Blur(Window::new(1, 2)).to_string(), "blur 3x5");
        assert_eq!(Step::Offset(-4).to_string(), "offset -4");
        assert_eq!(Step::Crop(Rect::new(1, 2, 3, 4)).to_string(), "crop 3x4+1+2");
    }
}
