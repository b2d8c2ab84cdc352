//! # Frame Grabber Library
//!
//! Extracts single frames from videos through an external ffmpeg, with
//! scale and crop parameters computed exactly from the source resolution.
//!
//! ## Module layout:
//! - `scaling`: Scale strategies (`ScaleProvider`) and `ScaleParameters`
//! - `cropping`: Crop strategies (`CropProvider`), `CropParameters`, `CropAlign`
//! - `normalize`: Input/output clamping shared by every strategy
//! - `metadata`: Duration and resolution parsing of ffmpeg's output
//! - `tool_resolver`: Locating the ffmpeg executable
//! - `servicer`: Running ffmpeg and collecting its output
//! - `modifiers`: Per-grab options (seek, scale, crop, order, format)
//! - `grabber`: Coordinates a full frame extraction
//! - `config`: Persistent CLI settings
//! - `error`: Error types
//! - `json_output`, `progress`, `utils`: CLI support
//!
//! ## Usage:
//! ```rust,ignore
//! use frame_grabber::{FfmpegServicer, FrameExtractionModifiers, FrameGrabber, WidthScaler};
//!
//! let grabber = FrameGrabber::new(FfmpegServicer::from_system().await?);
//! let modifiers = FrameExtractionModifiers::new();
//! modifiers.set_seek_time(Duration::from_secs(5));
//! modifiers.set_scale(Some(Arc::new(WidthScaler::new(640)?)));
//! let png = grabber.extract_frame(Path::new("clip.mp4"), &modifiers).await?;
//! ```

pub mod config;
pub mod cropping;
pub mod error;
pub mod grabber;
pub mod json_output;
pub mod metadata;
pub mod modifiers;
pub mod normalize;
pub mod progress;
pub mod scaling;
pub mod servicer;
pub mod tool_resolver;
pub mod utils;

pub use config::Config;
pub use cropping::{
    CropAlign, CropOffset, CropParameters, CropProvider, CustomCropper, SizeCropper,
    MIN_CROP_DIMENSION,
};
pub use error::{GrabError, Result};
pub use grabber::{FramePlan, FrameGrabber};
pub use metadata::VideoMetadata;
pub use modifiers::{FrameExtractionModifiers, ImageFormat, ModifierSnapshot, ScaleCropOrder};
pub use scaling::{
    BoundsScaler, CustomScaler, FitBoundsScaler, HeightScaler, MultiplyScaler, ScaleParameters,
    ScaleProvider, SizeScaler, WidthScaler,
};
pub use servicer::{FfmpegServicer, SystemRunner, ToolRunner};
pub use tool_resolver::ToolLocation;
