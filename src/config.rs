//! # Configuration Management Module
//!
//! Settings the CLI reads before building a grabber.
//!
//! ## Parameters:
//! - `ffmpeg_path`: ffmpeg file or directory (default: None = search `PATH`)
//! - `image_format`: Default output extension (default: "png")
//! - `read_buffer_size`: Chunk size for reading ffmpeg's stdout (default: 4096)
//! - `json_output`: Emit JSON lines instead of human readable text (default: false)
//!
//! The file lives at `<config dir>/frame-grabber/config.json`. A missing file
//! means defaults; a present but invalid one is an error.
//!
//! ## Example:
//! ```rust,ignore
//! let config = Config::from_file(&Config::default_path()?).await?;
//! let servicer = FfmpegServicer::locate(config.servicer_location()).await?
//!     .with_read_buffer_size(config.read_buffer_size);
//! ```

use crate::modifiers::ImageFormat;
use crate::servicer::DEFAULT_READ_BUFFER_SIZE;
use crate::tool_resolver::ToolLocation;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for frame extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ffmpeg executable or the directory holding it
    pub ffmpeg_path: Option<String>,
    /// Image format used when none is given on the command line
    pub image_format: String,
    /// Chunk size for reading ffmpeg's stdout
    pub read_buffer_size: usize,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            image_format: ImageFormat::png().extension().to_string(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(anyhow::anyhow!("Read buffer size must be greater than 0"));
        }

        ImageFormat::from_extension(&self.image_format)?;

        if let Some(ref ffmpeg_path) = self.ffmpeg_path {
            if ffmpeg_path.trim().is_empty() {
                return Err(anyhow::anyhow!("ffmpeg path must not be empty when set"));
            }
        }

        Ok(())
    }

    /// Default output format as a typed value
    pub fn default_image_format(&self) -> Result<ImageFormat> {
        Ok(ImageFormat::from_extension(&self.image_format)?)
    }

    /// Where ffmpeg should be looked for
    pub fn servicer_location(&self) -> ToolLocation {
        match &self.ffmpeg_path {
            Some(path) => ToolLocation::Path(path.clone()),
            None => ToolLocation::System,
        }
    }

    /// `<config dir>/frame-grabber/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine the user config directory")?;
        Ok(base.join("frame-grabber").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.read_buffer_size = 0;
        assert!(config.validate().is_err());

        config.read_buffer_size = 8192;
        config.image_format = "gif".to_string();
        assert!(config.validate().is_err());

        config.image_format = "jpeg".to_string();
        config.ffmpeg_path = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.ffmpeg_path, None);
        assert_eq!(config.image_format, "png");
        assert_eq!(config.read_buffer_size, 4096);
        assert!(!config.json_output);
        assert_eq!(config.servicer_location(), ToolLocation::System);
        assert_eq!(config.default_image_format().unwrap(), ImageFormat::png());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            ffmpeg_path: Some("/opt/ffmpeg/bin".to_string()),
            image_format: "jpg".to_string(),
            read_buffer_size: 65536,
            json_output: true,
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config, original_config);
        assert_eq!(
            loaded_config.servicer_location(),
            ToolLocation::Path("/opt/ffmpeg/bin".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "image_format": "webp" }"#).await.unwrap();

        let loaded = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.image_format, "webp");
        assert_eq!(loaded.read_buffer_size, 4096);
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "read_buffer_size": 0 }"#).await.unwrap();
        assert!(Config::from_file(&config_path).await.is_err());
    }
}
