//! # Error Types Module
//!
//! This module defines every error the frame grabber can report.
//!
//! ## Categories:
//! - `NullArgument`: a required argument was absent (`None`)
//! - `InvalidArgument`: an argument was present but empty or unusable
//! - `NotFound`: the ffmpeg executable (or its directory entry) is missing
//! - `InvalidFormat`: a file was found but it is not an ffmpeg executable
//! - `OutOfRange`: a numeric constructor argument broke its lower bound
//! - `Unimplemented`: a value from untyped input has no known meaning
//! - `FFmpeg`: ffmpeg wrote to its diagnostic stream; carries that text verbatim
//! - `MetadataUnavailable`: duration and resolution could not both be read
//! - `Io`: the OS refused to spawn or talk to a process
//!
//! Errors are raised where they are detected and propagated as is; nothing in
//! the library retries or falls back.
//!
//! ## Example:
//! ```rust,ignore
//! match servicer.run_capturing_output(&args).await {
//!     Err(GrabError::FFmpeg(text)) => eprintln!("ffmpeg rejected the request:\n{}", text),
//!     other => { /* ... */ }
//! }
//! ```

/// Custom error types for frame extraction
#[derive(thiserror::Error, Debug)]
pub enum GrabError {
    #[error("Required argument missing: {0}")]
    NullArgument(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GrabError {
    /// The raw diagnostic text written by ffmpeg, if this is an ffmpeg failure
    pub fn ffmpeg_output(&self) -> Option<&str> {
        match self {
            GrabError::FFmpeg(text) => Some(text),
            _ => None,
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, GrabError>;
