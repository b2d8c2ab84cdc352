//! # Scaling Strategies
//!
//! Pluggable rules that map the size of a source frame to the size ffmpeg
//! should scale it to.
//!
//! ## Strategies:
//! - `SizeScaler`: fixed output size, input is ignored
//! - `WidthScaler`: fixed width, height follows the input aspect ratio
//! - `HeightScaler`: fixed height, width follows the input aspect ratio
//! - `MultiplyScaler`: both sides multiplied by the same factor
//! - `BoundsScaler`: shrink (never grow) to fit inside a bounding box
//! - `FitBoundsScaler`: grow or shrink until the box is touched
//! - `CustomScaler`: caller supplied function
//!
//! Every strategy implements `ScaleProvider::scale_parameters` by handing its
//! own arithmetic to `normalize::normalize_scale`, so results are always at
//! least 1x1 and overflow saturates at `i32::MAX` instead of wrapping.
//!
//! ## Example:
//! ```rust
//! use frame_grabber::scaling::{BoundsScaler, ScaleProvider};
//!
//! let scaler = BoundsScaler::new(1280, 720).unwrap();
//! let params = scaler.scale_parameters(3840, 2160);
//! assert_eq!((params.width, params.height), (1280, 720));
//! ```

use crate::error::{GrabError, Result};
use crate::normalize::{normalize_scale, saturate_dimension, scale_ratio};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Output size of a scale strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaleParameters {
    pub width: i32,
    pub height: i32,
}

impl ScaleParameters {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// ffmpeg `scale` filter for these parameters
    pub fn to_filter(&self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }
}

/// A rule mapping an input frame size to an output frame size
pub trait ScaleProvider: Send + Sync {
    /// Normalized scale parameters for a frame of `input_width` x `input_height`
    fn scale_parameters(&self, input_width: i32, input_height: i32) -> ScaleParameters;
}

fn ensure_positive(value: i32, name: &str) -> Result<()> {
    if value <= 0 {
        return Err(GrabError::OutOfRange(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Scales every frame to the same size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeScaler {
    width: i32,
    height: i32,
}

impl SizeScaler {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        ensure_positive(width, "width")?;
        ensure_positive(height, "height")?;
        Ok(Self { width, height })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

impl ScaleProvider for SizeScaler {
    fn scale_parameters(&self, input_width: i32, input_height: i32) -> ScaleParameters {
        normalize_scale(input_width, input_height, |_, _| {
            ScaleParameters::new(self.width, self.height)
        })
    }
}

/// Fixes the width; the height keeps the input aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthScaler {
    width: i32,
}

impl WidthScaler {
    pub fn new(width: i32) -> Result<Self> {
        ensure_positive(width, "width")?;
        Ok(Self { width })
    }

    pub fn width(&self) -> i32 {
        self.width
    }
}

impl ScaleProvider for WidthScaler {
    fn scale_parameters(&self, input_width: i32, input_height: i32) -> ScaleParameters {
        normalize_scale(input_width, input_height, |w, h| {
            ScaleParameters::new(self.width, scale_ratio(self.width, h, w))
        })
    }
}

/// Fixes the height; the width keeps the input aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightScaler {
    height: i32,
}

impl HeightScaler {
    pub fn new(height: i32) -> Result<Self> {
        ensure_positive(height, "height")?;
        Ok(Self { height })
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

impl ScaleProvider for HeightScaler {
    fn scale_parameters(&self, input_width: i32, input_height: i32) -> ScaleParameters {
        normalize_scale(input_width, input_height, |w, h| {
            ScaleParameters::new(scale_ratio(self.height, w, h), self.height)
        })
    }
}

/// Multiplies both sides by the same factor.
///
/// Each side saturates on its own, so a huge side next to a small one can end
/// up with a different aspect ratio than the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiplyScaler {
    multiplier: f64,
}

impl MultiplyScaler {
    pub fn new(multiplier: f64) -> Result<Self> {
        if multiplier.is_nan() || multiplier <= 0.0 {
            return Err(GrabError::OutOfRange(format!(
                "multiplier must be positive, got {}",
                multiplier
            )));
        }
        Ok(Self { multiplier })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl ScaleProvider for MultiplyScaler {
    fn scale_parameters(&self, input_width: i32, input_height: i32) -> ScaleParameters {
        normalize_scale(input_width, input_height, |w, h| {
            ScaleParameters::new(
                saturate_dimension(w as f64 * self.multiplier),
                saturate_dimension(h as f64 * self.multiplier),
            )
        })
    }
}

/// Resizes `width` x `height` so it touches the bounding box on its binding
/// axis while keeping its aspect ratio.
///
/// Ratios are compared exactly through cross multiplication. Equal ratios
/// return the bounds untouched so no rounding creeps in.
fn touch_bounds(bounds_width: i32, bounds_height: i32, width: i32, height: i32) -> ScaleParameters {
    let input_cross = width as i64 * bounds_height as i64;
    let bounds_cross = bounds_width as i64 * height as i64;

    match input_cross.cmp(&bounds_cross) {
        // Wider than the bounds: width binds
        Ordering::Greater => {
            ScaleParameters::new(bounds_width, scale_ratio(bounds_width, height, width))
        }
        // Taller than the bounds: height binds
        Ordering::Less => {
            ScaleParameters::new(scale_ratio(bounds_height, width, height), bounds_height)
        }
        Ordering::Equal => ScaleParameters::new(bounds_width, bounds_height),
    }
}

/// Shrinks frames that do not fit inside a bounding box; smaller frames are
/// left alone.
///
/// Use `FitBoundsScaler` to also grow small frames up to the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsScaler {
    width_bounds: i32,
    height_bounds: i32,
}

impl BoundsScaler {
    pub fn new(width_bounds: i32, height_bounds: i32) -> Result<Self> {
        ensure_positive(width_bounds, "width bounds")?;
        ensure_positive(height_bounds, "height bounds")?;
        Ok(Self {
            width_bounds,
            height_bounds,
        })
    }

    pub fn width_bounds(&self) -> i32 {
        self.width_bounds
    }

    pub fn height_bounds(&self) -> i32 {
        self.height_bounds
    }
}

impl ScaleProvider for BoundsScaler {
    fn scale_parameters(&self, input_width: i32, input_height: i32) -> ScaleParameters {
        normalize_scale(input_width, input_height, |w, h| {
            if w <= self.width_bounds && h <= self.height_bounds {
                return ScaleParameters::new(w, h);
            }
            touch_bounds(self.width_bounds, self.height_bounds, w, h)
        })
    }
}

/// Scales frames up or down so they fill a bounding box on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitBoundsScaler {
    width_bounds: i32,
    height_bounds: i32,
}

impl FitBoundsScaler {
    pub fn new(width_bounds: i32, height_bounds: i32) -> Result<Self> {
        ensure_positive(width_bounds, "width bounds")?;
        ensure_positive(height_bounds, "height bounds")?;
        Ok(Self {
            width_bounds,
            height_bounds,
        })
    }

    pub fn width_bounds(&self) -> i32 {
        self.width_bounds
    }

    pub fn height_bounds(&self) -> i32 {
        self.height_bounds
    }
}

impl ScaleProvider for FitBoundsScaler {
    fn scale_parameters(&self, input_width: i32, input_height: i32) -> ScaleParameters {
        normalize_scale(input_width, input_height, |w, h| {
            touch_bounds(self.width_bounds, self.height_bounds, w, h)
        })
    }
}

/// Signature of a caller supplied scale function
pub type ScaleFn = dyn Fn(i32, i32) -> ScaleParameters + Send + Sync;

/// Delegates to a caller supplied function; the result is still normalized
pub struct CustomScaler {
    scale_fn: Box<ScaleFn>,
}

impl CustomScaler {
    /// Fails with `NullArgument` when no function is given
    pub fn new(scale_fn: Option<Box<ScaleFn>>) -> Result<Self> {
        let scale_fn =
            scale_fn.ok_or_else(|| GrabError::NullArgument("scale function".to_string()))?;
        Ok(Self { scale_fn })
    }

    pub fn from_fn<F>(scale_fn: F) -> Self
    where
        F: Fn(i32, i32) -> ScaleParameters + Send + Sync + 'static,
    {
        Self {
            scale_fn: Box::new(scale_fn),
        }
    }
}

impl fmt::Debug for CustomScaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomScaler").finish_non_exhaustive()
    }
}

impl ScaleProvider for CustomScaler {
    fn scale_parameters(&self, input_width: i32, input_height: i32) -> ScaleParameters {
        normalize_scale(input_width, input_height, |w, h| (self.scale_fn)(w, h))
    }
}
