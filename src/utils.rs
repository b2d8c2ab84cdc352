//! # Utility Functions Module
//!
//! Small helpers shared by the grabber and the CLI: argument vectors,
//! timestamps in ffmpeg's notation and the `WxH` / `X,Y` pairs used on the
//! command line.

use crate::error::{GrabError, Result};
use std::time::Duration;

/// Converts a vector of string-like items to Vec<String>.
///
/// # Example
/// ```rust
/// use frame_grabber::utils::to_string_vec;
///
/// let seconds = 12;
/// let args = to_string_vec(["-ss", &seconds.to_string(), "-frames:v", "1"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Builds an ffmpeg argument vector from items of mixed types.
///
/// # Example
/// ```rust
/// use frame_grabber::args;
///
/// let frames = 1;
/// let args = args!["-frames:v", frames, "-f", "image2pipe", "-"];
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::string::ToString::to_string(&$item)),*]
    };
}

/// Formats `time` as `HH:MM:SS.mmm`, the form ffmpeg accepts for `-ss`
pub fn format_timestamp(time: Duration) -> String {
    let total_millis = time.as_millis();
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis / 60_000) % 60;
    let seconds = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Parses a time given as seconds (`12.5`) or as `[HH:]MM:SS[.fff]`
pub fn parse_time(value: &str) -> Result<Duration> {
    let trimmed = value.trim();
    let invalid = || GrabError::InvalidArgument(format!("invalid time value: {}", value));

    let mut total = 0.0f64;
    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    for (index, part) in parts.iter().enumerate() {
        if !is_plain_decimal(part) {
            return Err(invalid());
        }
        let is_last = index + 1 == parts.len();
        let number: f64 = if is_last {
            part.parse().map_err(|_| invalid())?
        } else {
            part.parse::<u32>().map_err(|_| invalid())? as f64
        };
        if parts.len() > 1 && index > 0 && number >= 60.0 {
            return Err(invalid());
        }
        total = total * 60.0 + number;
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}

/// Digits with at most one decimal point: no sign, exponent, `inf` or `NaN`
fn is_plain_decimal(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value.chars().all(|c| c.is_ascii_digit() || c == '.')
        && value.matches('.').count() <= 1
}

/// Parses `WIDTHxHEIGHT` (e.g. `1280x720`)
pub fn parse_dimensions(value: &str) -> Result<(i32, i32)> {
    parse_pair(value, &['x', 'X'])
        .ok_or_else(|| GrabError::InvalidArgument(format!("expected WIDTHxHEIGHT, got: {}", value)))
}

/// Parses `X,Y` (e.g. `100,40`)
pub fn parse_offset(value: &str) -> Result<(i32, i32)> {
    parse_pair(value, &[','])
        .ok_or_else(|| GrabError::InvalidArgument(format!("expected X,Y, got: {}", value)))
}

fn parse_pair(value: &str, separators: &[char]) -> Option<(i32, i32)> {
    let (first, second) = value.trim().split_once(separators)?;
    Some((first.trim().parse().ok()?, second.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string_vec_mixed_types() {
        let frames = 1;
        let result = to_string_vec(["-frames:v", &frames.to_string(), "-an"]);
        assert_eq!(result, vec!["-frames:v".to_string(), "1".to_string(), "-an".to_string()]);
    }

    #[test]
    fn test_to_string_vec_empty() {
        let result: Vec<String> = to_string_vec(Vec::<&str>::new());
        assert_eq!(result, Vec::<String>::new());
    }

    #[test]
    fn test_args_macro() {
        let frames = 1;
        let result = args!["-frames:v", frames, "-f", "image2pipe"];
        assert_eq!(result, vec!["-frames:v", "1", "-f", "image2pipe"]);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Duration::ZERO), "00:00:00.000");
        assert_eq!(format_timestamp(Duration::from_millis(83_450)), "00:01:23.450");
        assert_eq!(format_timestamp(Duration::from_secs(36_000 + 61)), "10:01:01.000");
        assert_eq!(format_timestamp(Duration::from_micros(1_999)), "00:00:00.001");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("12.5").unwrap(), Duration::from_millis(12_500));
        assert_eq!(parse_time("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_time("01:30").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_time("01:00:02.25").unwrap(), Duration::from_millis(3_602_250));
        assert!(parse_time("").is_err());
        assert!(parse_time("-3").is_err());
        assert!(parse_time("00:61:00").is_err());
        assert!(parse_time("1:2:3:4").is_err());
        assert!(parse_time("ten").is_err());
        assert_eq!(parse_time(".5").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_time_rejects_signed_and_exotic_numbers() {
        let rejected = [
            "01:-5", "01:+5", "+01:30", "-0", "1e3", "00:1e1", "inf", "NaN", "1.2.3", "01:.",
        ];
        for value in rejected {
            assert!(parse_time(value).is_err(), "{} should be rejected", value);
        }
    }

    #[test]
    fn test_parse_pairs() {
        assert_eq!(parse_dimensions("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_dimensions(" 64X48 ").unwrap(), (64, 48));
        assert!(parse_dimensions("1280").is_err());
        assert!(parse_dimensions("axb").is_err());
        assert_eq!(parse_offset("100,40").unwrap(), (100, 40));
        assert_eq!(parse_offset("-5, 7").unwrap(), (-5, 7));
        assert!(parse_offset("100x40").is_err());
    }
}
