//! # Parameter Normalization
//!
//! Shared clamp-transform-clamp shell used by every scale and crop strategy.
//!
//! Strategies only ever see legal input (both sides at least the minimum) and
//! whatever they return is forced back into a legal range before it reaches a
//! caller. ffmpeg rejects degenerate filter arguments, so nothing that leaves
//! these functions may be degenerate.
//!
//! ## Rules:
//! - **Scale**: inputs below 1 become 1; outputs below 1 become 1.
//! - **Crop**: inputs below `MIN_CROP_DIMENSION` become the minimum; output
//!   width/height are clamped into `[MIN_CROP_DIMENSION, input]`. Offsets
//!   pass through untouched.

use crate::cropping::{CropParameters, MIN_CROP_DIMENSION};
use crate::scaling::ScaleParameters;

/// Smallest dimension a scale result may have
pub const MIN_SCALE_DIMENSION: i32 = 1;

/// Runs a scale transform through the normalization shell
pub fn normalize_scale<F>(input_width: i32, input_height: i32, transform: F) -> ScaleParameters
where
    F: FnOnce(i32, i32) -> ScaleParameters,
{
    let width = input_width.max(MIN_SCALE_DIMENSION);
    let height = input_height.max(MIN_SCALE_DIMENSION);

    let raw = transform(width, height);

    ScaleParameters::new(
        raw.width.max(MIN_SCALE_DIMENSION),
        raw.height.max(MIN_SCALE_DIMENSION),
    )
}

/// Runs a crop transform through the normalization shell.
///
/// The clamped input doubles as the upper bound of the output, so a crop can
/// never be larger than the frame it is taken from.
pub fn normalize_crop<F>(input_width: i32, input_height: i32, transform: F) -> CropParameters
where
    F: FnOnce(i32, i32) -> CropParameters,
{
    let width = input_width.max(MIN_CROP_DIMENSION);
    let height = input_height.max(MIN_CROP_DIMENSION);

    let raw = transform(width, height);

    CropParameters::new(
        raw.width.clamp(MIN_CROP_DIMENSION, width),
        raw.height.clamp(MIN_CROP_DIMENSION, height),
        raw.x,
        raw.y,
    )
}

/// Converts a floating point dimension to `i32`, saturating at `i32::MAX`.
///
/// Infinity saturates high; NaN and negatives fall to 0 and are then lifted
/// by the normalization shell.
pub fn saturate_dimension(value: f64) -> i32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= i32::MAX as f64 {
        i32::MAX
    } else {
        value as i32
    }
}

/// Narrows a widened integer result to `i32`, saturating at either end
pub fn saturate_wide(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// `value * numerator / denominator` without intermediate overflow.
///
/// The product is computed in `i64` (two `i32` factors always fit) and the
/// quotient saturates back into `i32`. A zero denominator saturates to
/// `i32::MAX`.
pub fn scale_ratio(value: i32, numerator: i32, denominator: i32) -> i32 {
    let product = value as i64 * numerator as i64;
    match product.checked_div(denominator as i64) {
        Some(quotient) => saturate_wide(quotient),
        None => i32::MAX,
    }
}
