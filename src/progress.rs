//! # Progress Feedback Module
//!
//! Terminal feedback for the CLI while ffmpeg works.
//!
//! A grab is a single ffmpeg run with no measurable progress, so the only
//! indicator is a spinner:
//! ```text
//! ⠋ Extracting frame at 00:00:12.500 from clip.mp4
//! ```
//!
//! ## Example:
//! ```rust,ignore
//! let spinner = ProgressManager::spinner("Reading metadata");
//! let info = grabber.metadata(&video).await?;
//! spinner.finish_and_clear();
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner construction for indeterminate work
pub struct ProgressManager;

impl ProgressManager {
    /// Create a spinner for indeterminate progress
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }

    /// A spinner that draws nothing, used in JSON mode
    pub fn hidden() -> ProgressBar {
        ProgressBar::hidden()
    }
}

/// Format byte size in human readable format
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_hidden_spinner_finishes() {
        let spinner = ProgressManager::hidden();
        spinner.set_message("working");
        spinner.finish_and_clear();
        assert!(spinner.is_finished());
    }
}
