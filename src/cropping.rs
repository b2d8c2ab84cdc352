//! # Cropping Strategies
//!
//! Pluggable rules that map the size of a source frame to the rectangle ffmpeg
//! should crop out of it.
//!
//! ## Strategies:
//! - `SizeCropper`: fixed size, with either explicit offsets or a `CropAlign`
//! - `CustomCropper`: caller supplied function
//!
//! Results go through `normalize::normalize_crop`: width and height end up in
//! `[MIN_CROP_DIMENSION, input]`. Offsets are passed on as computed and may be
//! negative or out of bounds.
//!
//! ## Alignment:
//! `crop_offset_from_align` turns one of nine anchor positions into an offset.
//! A crop that is larger than the input on an axis always gets offset 0 on
//! that axis.

use crate::error::{GrabError, Result};
use crate::normalize::normalize_crop;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest crop width/height ffmpeg's crop filter accepts reliably.
///
/// Found by trying the filter, not taken from ffmpeg documentation.
pub const MIN_CROP_DIMENSION: i32 = 2;

/// Output rectangle of a crop strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropParameters {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
}

impl CropParameters {
    pub fn new(width: i32, height: i32, x: i32, y: i32) -> Self {
        Self {
            width,
            height,
            x,
            y,
        }
    }

    /// ffmpeg `crop` filter for these parameters
    pub fn to_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

/// Offset of a crop rectangle inside its source frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropOffset {
    pub x: i32,
    pub y: i32,
}

/// Anchor position of a crop rectangle.
///
/// `None` means the offsets are given explicitly instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CropAlign {
    #[default]
    None,
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl CropAlign {
    pub const ALL: [CropAlign; 10] = [
        CropAlign::None,
        CropAlign::TopLeft,
        CropAlign::TopCenter,
        CropAlign::TopRight,
        CropAlign::CenterLeft,
        CropAlign::Center,
        CropAlign::CenterRight,
        CropAlign::BottomLeft,
        CropAlign::BottomCenter,
        CropAlign::BottomRight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CropAlign::None => "none",
            CropAlign::TopLeft => "top-left",
            CropAlign::TopCenter => "top-center",
            CropAlign::TopRight => "top-right",
            CropAlign::CenterLeft => "center-left",
            CropAlign::Center => "center",
            CropAlign::CenterRight => "center-right",
            CropAlign::BottomLeft => "bottom-left",
            CropAlign::BottomCenter => "bottom-center",
            CropAlign::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for CropAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CropAlign {
    type Err = GrabError;

    /// Accepts `top-left`, `top_left`, `TopLeft` and friends
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        CropAlign::ALL
            .into_iter()
            .find(|align| align.name().replace('-', "") == key)
            .ok_or_else(|| GrabError::Unimplemented(format!("unknown crop alignment '{}'", s)))
    }
}

impl TryFrom<u8> for CropAlign {
    type Error = GrabError;

    fn try_from(code: u8) -> Result<Self> {
        CropAlign::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| {
                GrabError::Unimplemented(format!("unknown crop alignment code {}", code))
            })
    }
}

/// Offset that places a `crop_width` x `crop_height` rectangle at `align`
/// inside a `input_width` x `input_height` frame
pub fn crop_offset_from_align(
    crop_width: i32,
    crop_height: i32,
    input_width: i32,
    input_height: i32,
    align: CropAlign,
) -> CropOffset {
    let available_width = input_width.saturating_sub(crop_width).max(0);
    let available_height = input_height.saturating_sub(crop_height).max(0);

    let x = match align {
        CropAlign::None | CropAlign::TopLeft | CropAlign::CenterLeft | CropAlign::BottomLeft => 0,
        CropAlign::TopCenter | CropAlign::Center | CropAlign::BottomCenter => available_width / 2,
        CropAlign::TopRight | CropAlign::CenterRight | CropAlign::BottomRight => available_width,
    };

    let y = match align {
        CropAlign::None | CropAlign::TopLeft | CropAlign::TopCenter | CropAlign::TopRight => 0,
        CropAlign::CenterLeft | CropAlign::Center | CropAlign::CenterRight => {
            available_height / 2
        }
        CropAlign::BottomLeft | CropAlign::BottomCenter | CropAlign::BottomRight => {
            available_height
        }
    };

    CropOffset { x, y }
}

/// A rule mapping an input frame size to a crop rectangle
pub trait CropProvider: Send + Sync {
    /// Normalized crop parameters for a frame of `input_width` x `input_height`
    fn crop_parameters(&self, input_width: i32, input_height: i32) -> CropParameters;
}

fn ensure_crop_dimension(value: i32, name: &str) -> Result<()> {
    if value < MIN_CROP_DIMENSION {
        return Err(GrabError::OutOfRange(format!(
            "crop {} must be at least {}, got {}",
            name, MIN_CROP_DIMENSION, value
        )));
    }
    Ok(())
}

/// Crops a fixed size rectangle, placed by explicit offsets or by alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCropper {
    width: i32,
    height: i32,
    x: i32,
    y: i32,
    align: CropAlign,
}

impl SizeCropper {
    /// Crop anchored at the top-left corner
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Self::with_offset(width, height, 0, 0)
    }

    pub fn with_offset(width: i32, height: i32, x: i32, y: i32) -> Result<Self> {
        ensure_crop_dimension(width, "width")?;
        ensure_crop_dimension(height, "height")?;
        Ok(Self {
            width,
            height,
            x,
            y,
            align: CropAlign::None,
        })
    }

    /// Offsets are resolved from `align` once the input size is known
    pub fn with_align(width: i32, height: i32, align: CropAlign) -> Result<Self> {
        ensure_crop_dimension(width, "width")?;
        ensure_crop_dimension(height, "height")?;
        Ok(Self {
            width,
            height,
            x: 0,
            y: 0,
            align,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn align(&self) -> CropAlign {
        self.align
    }
}

impl CropProvider for SizeCropper {
    fn crop_parameters(&self, input_width: i32, input_height: i32) -> CropParameters {
        normalize_crop(input_width, input_height, |w, h| {
            if self.align == CropAlign::None {
                return CropParameters::new(self.width, self.height, self.x, self.y);
            }
            let offset = crop_offset_from_align(self.width, self.height, w, h, self.align);
            CropParameters::new(self.width, self.height, offset.x, offset.y)
        })
    }
}

/// Signature of a caller supplied crop function
pub type CropFn = dyn Fn(i32, i32) -> CropParameters + Send + Sync;

/// Delegates to a caller supplied function; the result is still normalized
pub struct CustomCropper {
    crop_fn: Box<CropFn>,
}

impl CustomCropper {
    /// Fails with `NullArgument` when no function is given
    pub fn new(crop_fn: Option<Box<CropFn>>) -> Result<Self> {
        let crop_fn = crop_fn.ok_or_else(|| GrabError::NullArgument("crop function".to_string()))?;
        Ok(Self { crop_fn })
    }

    pub fn from_fn<F>(crop_fn: F) -> Self
    where
        F: Fn(i32, i32) -> CropParameters + Send + Sync + 'static,
    {
        Self {
            crop_fn: Box::new(crop_fn),
        }
    }
}

impl fmt::Debug for CustomCropper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCropper").finish_non_exhaustive()
    }
}

impl CropProvider for CustomCropper {
    fn crop_parameters(&self, input_width: i32, input_height: i32) -> CropParameters {
        normalize_crop(input_width, input_height, |w, h| (self.crop_fn)(w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(x: i32, y: i32) -> CropOffset {
        CropOffset { x, y }
    }

    #[test]
    fn test_align_offsets_inside_frame() {
        let cases = [
            (CropAlign::None, offset(0, 0)),
            (CropAlign::TopLeft, offset(0, 0)),
            (CropAlign::TopCenter, offset(200, 0)),
            (CropAlign::TopRight, offset(400, 0)),
            (CropAlign::CenterLeft, offset(0, 200)),
            (CropAlign::Center, offset(200, 200)),
            (CropAlign::CenterRight, offset(400, 200)),
            (CropAlign::BottomLeft, offset(0, 400)),
            (CropAlign::BottomCenter, offset(200, 400)),
            (CropAlign::BottomRight, offset(400, 400)),
        ];
        for (align, expected) in cases {
            assert_eq!(crop_offset_from_align(100, 100, 500, 500, align), expected, "{}", align);
        }
    }

    #[test]
    fn test_oversized_crop_gets_zero_offset() {
        for align in CropAlign::ALL {
            assert_eq!(crop_offset_from_align(1000, 1000, 500, 500, align), offset(0, 0));
        }
        // Only the oversized axis is forced to zero
        assert_eq!(
            crop_offset_from_align(1000, 100, 500, 500, CropAlign::BottomRight),
            offset(0, 400)
        );
    }

    #[test]
    fn test_center_uses_integer_division() {
        assert_eq!(crop_offset_from_align(2, 2, 7, 8, CropAlign::Center), offset(2, 3));
    }

    #[test]
    fn test_parse_alignment() {
        assert_eq!("center".parse::<CropAlign>().unwrap(), CropAlign::Center);
        assert_eq!("Bottom_Right".parse::<CropAlign>().unwrap(), CropAlign::BottomRight);
        assert_eq!("TopCenter".parse::<CropAlign>().unwrap(), CropAlign::TopCenter);
        assert!(matches!("middle".parse::<CropAlign>(), Err(GrabError::Unimplemented(_))));
    }

    #[test]
    fn test_alignment_from_code() {
        assert_eq!(CropAlign::try_from(0).unwrap(), CropAlign::None);
        assert_eq!(CropAlign::try_from(9).unwrap(), CropAlign::BottomRight);
        assert!(matches!(CropAlign::try_from(10), Err(GrabError::Unimplemented(_))));
    }

    #[test]
    fn test_size_cropper_with_offset() {
        let cropper = SizeCropper::with_offset(100, 50, -10, 700).unwrap();
        assert_eq!(cropper.crop_parameters(640, 480), CropParameters::new(100, 50, -10, 700));
    }

    #[test]
    fn test_size_cropper_with_align() {
        let cropper = SizeCropper::with_align(100, 100, CropAlign::Center).unwrap();
        assert_eq!((cropper.x(), cropper.y()), (0, 0));
        assert_eq!(cropper.crop_parameters(500, 500), CropParameters::new(100, 100, 200, 200));
    }

    #[test]
    fn test_size_cropper_never_exceeds_input() {
        let cropper = SizeCropper::with_align(1000, 1000, CropAlign::Center).unwrap();
        assert_eq!(cropper.crop_parameters(500, 300), CropParameters::new(500, 300, 0, 0));
    }

    #[test]
    fn test_size_cropper_rejects_small_dimensions() {
        assert!(matches!(SizeCropper::new(1, 10), Err(GrabError::OutOfRange(_))));
        assert!(matches!(SizeCropper::with_offset(10, 0, 0, 0), Err(GrabError::OutOfRange(_))));
        assert!(matches!(
            SizeCropper::with_align(0, 0, CropAlign::Center),
            Err(GrabError::OutOfRange(_))
        ));
        assert!(SizeCropper::new(MIN_CROP_DIMENSION, MIN_CROP_DIMENSION).is_ok());
    }

    #[test]
    fn test_all_croppers_stay_within_input() {
        let croppers: Vec<Box<dyn CropProvider>> = vec![
            Box::new(SizeCropper::new(2, 2).unwrap()),
            Box::new(SizeCropper::with_offset(5000, 3, 1, 1).unwrap()),
            Box::new(SizeCropper::with_align(640, 640, CropAlign::BottomRight).unwrap()),
            Box::new(CustomCropper::from_fn(|w, h| {
                CropParameters::new(w.saturating_mul(4), -h, 0, 0)
            })),
            Box::new(CustomCropper::from_fn(|_, _| CropParameters::new(0, 0, 0, 0))),
        ];
        let sizes = [(2, 2), (3, 1000), (1920, 1080), (i32::MAX, i32::MAX)];

        for cropper in &croppers {
            for &(w, h) in &sizes {
                let params = cropper.crop_parameters(w, h);
                assert!((MIN_CROP_DIMENSION..=w).contains(&params.width));
                assert!((MIN_CROP_DIMENSION..=h).contains(&params.height));
            }
        }
    }

    #[test]
    fn test_custom_cropper_requires_function() {
        assert!(matches!(CustomCropper::new(None), Err(GrabError::NullArgument(_))));
    }

    #[test]
    fn test_custom_cropper_output_is_clamped() {
        let crop_fn: Box<CropFn> = Box::new(|w, h| CropParameters::new(w + 10, 1, -5, h));
        let cropper = CustomCropper::new(Some(crop_fn)).unwrap();
        assert_eq!(cropper.crop_parameters(100, 80), CropParameters::new(100, 2, -5, 80));
    }

    #[test]
    fn test_crop_filter() {
        assert_eq!(CropParameters::new(100, 50, 3, 4).to_filter(), "crop=100:50:3:4");
    }
}
