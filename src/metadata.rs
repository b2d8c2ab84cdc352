//! # Video Metadata Module
//!
//! Pulls the duration and resolution of a video out of the free-form text
//! ffmpeg prints on stderr when it is asked to dump a file's information.
//!
//! ## Recognized lines:
//! - `Duration: 00:01:23.45, start: 0.000000, bitrate: ...`
//! - `Stream #0:0(und): Video: h264 ..., yuv420p, 1920x1080 [SAR 1:1 DAR 16:9]`
//!
//! The duration pattern is `HH:MM:SS.ff`; ffmpeg always prints exactly two
//! fractional digits. The resolution pattern asks for 2 to 5 digits on each
//! side of the `x`: one digit would match the `0x...` codec tags ffmpeg
//! prints on the same line, and no real video is 100,000 pixels wide.
//!
//! Lines can arrive in any order. `MetadataScanner` collects them until both
//! values were seen.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Duration;

/// Prefix of the line carrying the container duration
pub const DURATION_MARKER: &str = "Duration";
/// Prefix of the lines describing streams
pub const STREAM_MARKER: &str = "Stream";

/// Width, height and duration of a video as reported by ffmpeg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub width: i32,
    pub height: i32,
    pub duration: Duration,
}

impl VideoMetadata {
    pub fn new(width: i32, height: i32, duration: Duration) -> Self {
        Self {
            width,
            height,
            duration,
        }
    }
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{2}):(\d{2}):(\d{2})\.(\d{2})").expect("duration pattern is valid")
    })
}

fn resolution_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{2,5})x(\d{2,5})").expect("resolution pattern is valid"))
}

/// Parses the first `HH:MM:SS.ff` found in `line`.
///
/// Minutes or seconds of 60 and above make the value unparsable.
pub fn parse_duration(line: &str) -> Option<Duration> {
    let caps = duration_regex().captures(line)?;

    let hours: u64 = caps[1].parse().ok()?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    let hundredths: u64 = caps[4].parse().ok()?;

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    let whole_seconds = hours * 3600 + minutes * 60 + seconds;
    Some(Duration::from_secs(whole_seconds) + Duration::from_millis(hundredths * 10))
}

/// Parses the first `WIDTHxHEIGHT` found in `line`
pub fn parse_resolution(line: &str) -> Option<(i32, i32)> {
    let caps = resolution_regex().captures(line)?;
    // At most five digits each, always fits
    let width: i32 = caps[1].parse().ok()?;
    let height: i32 = caps[2].parse().ok()?;
    Some((width, height))
}

/// Accumulates duration and resolution from ffmpeg's information dump
#[derive(Debug, Default, Clone)]
pub struct MetadataScanner {
    duration: Option<Duration>,
    resolution: Option<(i32, i32)>,
}

impl MetadataScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line of output. Returns `true` once both values are known.
    ///
    /// A value that was already found is never replaced, so an audio stream
    /// listed after the video stream cannot erase its resolution.
    pub fn feed(&mut self, line: &str) -> bool {
        let line = line.trim();

        if self.duration.is_none() && line.starts_with(DURATION_MARKER) {
            self.duration = parse_duration(line);
        }
        if self.resolution.is_none() && line.starts_with(STREAM_MARKER) {
            self.resolution = parse_resolution(line);
        }

        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.duration.is_some() && self.resolution.is_some()
    }

    pub fn finish(&self) -> Option<VideoMetadata> {
        let duration = self.duration?;
        let (width, height) = self.resolution?;
        Some(VideoMetadata::new(width, height, duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            parse_duration("Duration: 00:01:23.45, start: 0.000000, bitrate: 2013 kb/s"),
            Some(Duration::from_millis(83_450))
        );
        assert_eq!(
            parse_duration("Duration: 02:00:00.00"),
            Some(Duration::from_secs(7200))
        );
        assert_eq!(parse_duration("Duration: N/A, bitrate: N/A"), None);
        assert_eq!(parse_duration("Duration: 00:75:00.00"), None);
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(
            parse_resolution("Stream #0:0: Video: h264, yuv420p, 1920x1080"),
            Some((1920, 1080))
        );
        assert_eq!(
            parse_resolution(concat!(
                "Stream #0:0(und): Video: h264 (High) (avc1 / 0x31637661), ",
                "yuv420p(tv), 640x360 [SAR 1:1 DAR 16:9]"
            )),
            Some((640, 360))
        );
        assert_eq!(parse_resolution("Stream #0:1(und): Audio: aac (LC), 48000 Hz"), None);
    }

    #[test]
    fn test_scanner_collects_both_values() {
        let mut scanner = MetadataScanner::new();
        assert!(!scanner.feed("Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':"));
        assert!(!scanner.feed("  Duration: 00:01:23.45, start: 0.000000, bitrate: 2013 kb/s"));
        assert!(!scanner.feed("  Stream #0:1(und): Audio: aac (LC), 48000 Hz, stereo"));
        assert!(scanner.feed("  Stream #0:0: Video: h264, yuv420p, 1920x1080"));

        assert_eq!(
            scanner.finish(),
            Some(VideoMetadata::new(1920, 1080, Duration::from_millis(83_450)))
        );
    }

    #[test]
    fn test_scanner_keeps_first_resolution() {
        let mut scanner = MetadataScanner::new();
        scanner.feed("Stream #0:0: Video: h264, yuv420p, 1280x720");
        scanner.feed("Stream #0:1: Video: mjpeg, yuvj420p, 300x300 (attached pic)");
        scanner.feed("Duration: 00:00:10.00, start: 0.000000");
        assert_eq!(scanner.finish().map(|m| (m.width, m.height)), Some((1280, 720)));
    }

    #[test]
    fn test_scanner_ignores_unmarked_lines() {
        let mut scanner = MetadataScanner::new();
        scanner.feed("encoder: Lavf 1920x1080 at 00:00:01.00");
        assert!(!scanner.is_complete());
        assert_eq!(scanner.finish(), None);
    }
}
