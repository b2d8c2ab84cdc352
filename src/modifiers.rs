//! # Extraction Modifiers Module
//!
//! Everything a caller can tune about a single frame grab: where to seek,
//! how to scale, how to crop, in which order, and which image format to
//! encode.
//!
//! `FrameExtractionModifiers` may be shared between threads. All fields sit
//! behind one lock, and `snapshot()` copies them out in one step so an
//! extraction never sees half of a concurrent update.

use crate::cropping::CropProvider;
use crate::error::{GrabError, Result};
use crate::scaling::ScaleProvider;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Output encoding of an extracted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImageFormat {
    extension: &'static str,
    codec: &'static str,
}

impl ImageFormat {
    pub const fn png() -> Self {
        Self {
            extension: "png",
            codec: "png",
        }
    }

    pub const fn jpeg() -> Self {
        Self {
            extension: "jpg",
            codec: "mjpeg",
        }
    }

    pub const fn bmp() -> Self {
        Self {
            extension: "bmp",
            codec: "bmp",
        }
    }

    pub const fn webp() -> Self {
        Self {
            extension: "webp",
            codec: "libwebp",
        }
    }

    pub const fn tiff() -> Self {
        Self {
            extension: "tiff",
            codec: "tiff",
        }
    }

    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// ffmpeg encoder name passed to `-c:v`
    pub fn codec(&self) -> &'static str {
        self.codec
    }

    /// Looks up a format by file extension, case-insensitively
    pub fn from_extension(extension: &str) -> Result<Self> {
        let normalized = extension.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "png" => Ok(Self::png()),
            "jpg" | "jpeg" => Ok(Self::jpeg()),
            "bmp" => Ok(Self::bmp()),
            "webp" => Ok(Self::webp()),
            "tif" | "tiff" => Ok(Self::tiff()),
            _ => Err(GrabError::InvalidArgument(format!(
                "unsupported image format: {}",
                extension
            ))),
        }
    }
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self::png()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension)
    }
}

/// Which of the two filters runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ScaleCropOrder {
    #[default]
    ScaleFirst,
    CropFirst,
}

/// Detached copy of the modifiers taken for one extraction
#[derive(Clone, Default)]
pub struct ModifierSnapshot {
    pub seek_time: Duration,
    pub scale: Option<Arc<dyn ScaleProvider>>,
    pub crop: Option<Arc<dyn CropProvider>>,
    pub order: ScaleCropOrder,
    pub image_format: Option<ImageFormat>,
}

impl ModifierSnapshot {
    /// The chosen format, or PNG when none was set
    pub fn image_format_or_default(&self) -> ImageFormat {
        self.image_format.unwrap_or_default()
    }
}

impl fmt::Debug for ModifierSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierSnapshot")
            .field("seek_time", &self.seek_time)
            .field("scale", &self.scale.is_some())
            .field("crop", &self.crop.is_some())
            .field("order", &self.order)
            .field("image_format", &self.image_format)
            .finish()
    }
}

/// Thread-safe, mutable set of extraction options
#[derive(Debug, Default)]
pub struct FrameExtractionModifiers {
    inner: Mutex<ModifierSnapshot>,
}

impl FrameExtractionModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the plain fields torn
    fn lock(&self) -> MutexGuard<'_, ModifierSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ModifierSnapshot {
        self.lock().clone()
    }

    pub fn seek_time(&self) -> Duration {
        self.lock().seek_time
    }

    pub fn set_seek_time(&self, seek_time: Duration) {
        self.lock().seek_time = seek_time;
    }

    pub fn scale(&self) -> Option<Arc<dyn ScaleProvider>> {
        self.lock().scale.clone()
    }

    pub fn set_scale(&self, scale: Option<Arc<dyn ScaleProvider>>) {
        self.lock().scale = scale;
    }

    pub fn crop(&self) -> Option<Arc<dyn CropProvider>> {
        self.lock().crop.clone()
    }

    pub fn set_crop(&self, crop: Option<Arc<dyn CropProvider>>) {
        self.lock().crop = crop;
    }

    pub fn order(&self) -> ScaleCropOrder {
        self.lock().order
    }

    pub fn set_order(&self, order: ScaleCropOrder) {
        self.lock().order = order;
    }

    pub fn image_format(&self) -> Option<ImageFormat> {
        self.lock().image_format
    }

    pub fn set_image_format(&self, image_format: Option<ImageFormat>) {
        self.lock().image_format = image_format;
    }
}
