//! # Frame Grabber Module
//!
//! Ties the pieces together: reads the video's metadata, resolves the scale
//! and crop providers against the real frame size, and asks ffmpeg for one
//! encoded frame.
//!
//! ## Filter order:
//! With `ScaleFirst` the crop is computed on the scaled size; with
//! `CropFirst` the scale is computed on the cropped size. Both filters are
//! joined into one `-vf` chain in the order they run.
//!
//! ## Seeking past the end:
//! A seek time at or beyond the duration would give ffmpeg nothing to
//! decode, so it is moved to `END_OF_VIDEO_MARGIN` before the end.

use crate::args;
use crate::cropping::CropProvider;
use crate::error::{GrabError, Result};
use crate::metadata::VideoMetadata;
use crate::modifiers::{FrameExtractionModifiers, ImageFormat, ScaleCropOrder};
use crate::scaling::ScaleProvider;
use crate::servicer::FfmpegServicer;
use crate::utils::format_timestamp;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Distance from the end used when the requested time is out of range
pub const END_OF_VIDEO_MARGIN: Duration = Duration::from_millis(100);

/// Seek time actually sent to ffmpeg
pub fn effective_seek_time(requested: Duration, duration: Duration) -> Duration {
    if requested >= duration {
        duration.saturating_sub(END_OF_VIDEO_MARGIN)
    } else {
        requested
    }
}

/// Resolves the providers against a `width` x `height` frame and renders the
/// filters in the order they apply
pub fn build_filters(
    width: i32,
    height: i32,
    scale: Option<&dyn ScaleProvider>,
    crop: Option<&dyn CropProvider>,
    order: ScaleCropOrder,
) -> Vec<String> {
    let mut filters = Vec::with_capacity(2);
    let (mut width, mut height) = (width, height);

    match order {
        ScaleCropOrder::ScaleFirst => {
            if let Some(scale) = scale {
                let params = scale.scale_parameters(width, height);
                (width, height) = (params.width, params.height);
                filters.push(params.to_filter());
            }
            if let Some(crop) = crop {
                filters.push(crop.crop_parameters(width, height).to_filter());
            }
        }
        ScaleCropOrder::CropFirst => {
            if let Some(crop) = crop {
                let params = crop.crop_parameters(width, height);
                (width, height) = (params.width, params.height);
                filters.push(params.to_filter());
            }
            if let Some(scale) = scale {
                filters.push(scale.scale_parameters(width, height).to_filter());
            }
        }
    }

    filters
}

/// Everything decided before ffmpeg is started
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub metadata: VideoMetadata,
    pub seek_time: Duration,
    pub filters: Vec<String>,
    pub format: ImageFormat,
}

impl FramePlan {
    /// ffmpeg arguments up to (not including) the output destination
    fn input_args(&self, video: &Path) -> Vec<String> {
        let mut args = args![
            "-ss",
            format_timestamp(self.seek_time),
            "-i",
            video.display(),
            "-an",
            "-frames:v",
            1
        ];
        if !self.filters.is_empty() {
            args.extend(args!["-vf", self.filters.join(",")]);
        }
        args.extend(args!["-c:v", self.format.codec()]);
        args
    }
}

/// Extracts single frames from videos through one ffmpeg servicer
#[derive(Debug, Clone)]
pub struct FrameGrabber {
    servicer: FfmpegServicer,
}

impl FrameGrabber {
    pub fn new(servicer: FfmpegServicer) -> Self {
        Self { servicer }
    }

    pub fn servicer(&self) -> &FfmpegServicer {
        &self.servicer
    }

    pub async fn metadata(&self, video: &Path) -> Result<VideoMetadata> {
        self.servicer.get_metadata(video).await
    }

    /// Reads the metadata and resolves the current modifiers against it
    pub async fn plan(
        &self,
        video: &Path,
        modifiers: &FrameExtractionModifiers,
    ) -> Result<FramePlan> {
        let snapshot = modifiers.snapshot();
        let metadata = self.servicer.get_metadata(video).await?;

        let seek_time = effective_seek_time(snapshot.seek_time, metadata.duration);
        if seek_time != snapshot.seek_time {
            debug!(
                "Seek time {:?} is past the end ({:?}), using {:?}",
                snapshot.seek_time, metadata.duration, seek_time
            );
        }

        let filters = build_filters(
            metadata.width,
            metadata.height,
            snapshot.scale.as_deref(),
            snapshot.crop.as_deref(),
            snapshot.order,
        );

        Ok(FramePlan {
            metadata,
            seek_time,
            filters,
            format: snapshot.image_format_or_default(),
        })
    }

    /// Returns the encoded bytes of the frame at the modifiers' seek time
    pub async fn extract_frame(
        &self,
        video: &Path,
        modifiers: &FrameExtractionModifiers,
    ) -> Result<Vec<u8>> {
        let plan = self.plan(video, modifiers).await?;

        let mut args = plan.input_args(video);
        args.extend(args!["-f", "image2pipe", "-"]);

        let bytes = self.servicer.run_capturing_output(&args).await?;
        info!(
            "Extracted {} frame at {} from {} ({} bytes)",
            plan.format,
            format_timestamp(plan.seek_time),
            video.display(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Lets ffmpeg write the frame straight to `output`, replacing it
    pub async fn extract_frame_to_file(
        &self,
        video: &Path,
        output: &Path,
        modifiers: &FrameExtractionModifiers,
    ) -> Result<FramePlan> {
        if output.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(GrabError::InvalidArgument(
                "no output path specified (path was empty)".to_string(),
            ));
        }

        let plan = self.plan(video, modifiers).await?;

        let mut args = plan.input_args(video);
        args.extend(args!["-f", "image2", "-y", output.display()]);

        self.servicer.run_discarding_output(&args).await?;
        info!(
            "Wrote frame at {} from {} to {}",
            format_timestamp(plan.seek_time),
            video.display(),
            output.display()
        );
        Ok(plan)
    }
}
