//! # JSON Output Module
//!
//! Structured JSON lines on stdout for programs that drive the CLI.
//!
//! ## Message types:
//! - `metadata`: Duration and resolution of a video
//! - `extracted`: A frame was written to disk
//! - `tool`: Location of the validated ffmpeg executable
//! - `error`: The command failed

use crate::error::GrabError;
use crate::metadata::VideoMetadata;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tagged JSON message
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum JsonMessage {
    #[serde(rename = "metadata")]
    Metadata {
        video: PathBuf,
        width: i32,
        height: i32,
        duration_seconds: f64,
    },

    #[serde(rename = "extracted")]
    Extracted {
        video: PathBuf,
        output: PathBuf,
        format: String,
        seek_seconds: f64,
        size: u64,
    },

    #[serde(rename = "tool")]
    Tool { ffmpeg: PathBuf },

    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emits the message as one line on stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn metadata(video: PathBuf, metadata: &VideoMetadata) -> Self {
        Self::Metadata {
            video,
            width: metadata.width,
            height: metadata.height,
            duration_seconds: metadata.duration.as_secs_f64(),
        }
    }

    pub fn extracted(
        video: PathBuf,
        output: PathBuf,
        format: &str,
        seek_seconds: f64,
        size: u64,
    ) -> Self {
        Self::Extracted {
            video,
            output,
            format: format.to_string(),
            seek_seconds,
            size,
        }
    }

    pub fn tool(ffmpeg: PathBuf) -> Self {
        Self::Tool { ffmpeg }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }

    /// Error message for a failed command; ffmpeg's own text goes in `details`
    pub fn from_error(error: &anyhow::Error) -> Self {
        let details = error
            .downcast_ref::<GrabError>()
            .and_then(GrabError::ffmpeg_output)
            .map(|text| text.trim_end().to_string());
        Self::error(error.to_string(), details)
    }
}
