//! # Frame Grabber - Main Entry Point
//!
//! Command line front end of the library.
//!
//! ## Responsibilities:
//! - Parse the command line with `clap`
//! - Set up logging with `tracing` (stderr, `RUST_LOG` aware)
//! - Merge the config file with command line overrides
//! - Run `info`, `extract` or `check`
//!
//! ## Usage:
//! ```bash
//! frame-grabber info clip.mp4
//! frame-grabber extract clip.mp4 -o thumb.jpg --time 00:00:12.5 --bounds 320x240
//! frame-grabber extract clip.mp4 -o face.png --crop 400x400 --align top-center \
//!     --crop-first --width 200
//! frame-grabber --ffmpeg /opt/ffmpeg/bin --json check
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use frame_grabber::json_output::JsonMessage;
use frame_grabber::progress::{format_size, ProgressManager};
use frame_grabber::utils::{format_timestamp, parse_dimensions, parse_offset, parse_time};
use frame_grabber::{
    BoundsScaler, Config, CropAlign, CropProvider, FfmpegServicer, FitBoundsScaler,
    FrameExtractionModifiers, FrameGrabber, HeightScaler, ImageFormat, MultiplyScaler,
    ScaleCropOrder, ScaleProvider, SizeCropper, SizeScaler, WidthScaler,
};

#[derive(Parser)]
#[command(name = "frame-grabber", version)]
#[command(about = "Extract single video frames through FFmpeg")]
struct Cli {
    /// ffmpeg executable, or the directory containing it (default: search PATH)
    #[arg(long, global = true)]
    ffmpeg: Option<String>,

    /// Config file (default: <config dir>/frame-grabber/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as JSON lines for programmatic use
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolution and duration of a video
    Info {
        /// Video file
        video: PathBuf,
    },

    /// Extract one frame to an image file
    Extract(ExtractArgs),

    /// Locate and validate ffmpeg
    Check,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Video file
    video: PathBuf,

    /// Image file to write (replaced if it exists)
    #[arg(short, long)]
    output: PathBuf,

    /// Seek time, in seconds or HH:MM:SS[.fff]
    #[arg(short, long, default_value = "0", value_parser = parse_time)]
    time: Duration,

    /// Image format (png, jpg, bmp, webp, tiff); default from the output extension
    #[arg(short, long)]
    format: Option<String>,

    #[command(flatten)]
    scale: ScaleArgs,

    /// Crop size, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_dimensions)]
    crop: Option<(i32, i32)>,

    /// Crop alignment (center, top-left, bottom-right, ...)
    #[arg(long, requires = "crop", conflicts_with = "offset")]
    align: Option<CropAlign>,

    /// Crop offset, X,Y
    #[arg(long, requires = "crop", value_parser = parse_offset, allow_hyphen_values = true)]
    offset: Option<(i32, i32)>,

    /// Crop before scaling (default: scale first)
    #[arg(long)]
    crop_first: bool,
}

#[derive(clap::Args)]
#[group(multiple = false)]
struct ScaleArgs {
    /// Scale to this width, keeping the aspect ratio
    #[arg(long)]
    width: Option<i32>,

    /// Scale to this height, keeping the aspect ratio
    #[arg(long)]
    height: Option<i32>,

    /// Scale to exactly WIDTHxHEIGHT
    #[arg(long, value_parser = parse_dimensions)]
    size: Option<(i32, i32)>,

    /// Multiply both dimensions by this factor
    #[arg(long)]
    multiply: Option<f64>,

    /// Shrink to fit inside WIDTHxHEIGHT, keeping the aspect ratio; never enlarge
    #[arg(long, value_parser = parse_dimensions)]
    bounds: Option<(i32, i32)>,

    /// Like --bounds, but also enlarge until one side touches WIDTHxHEIGHT
    #[arg(long, value_parser = parse_dimensions)]
    fit: Option<(i32, i32)>,
}

impl ScaleArgs {
    fn provider(&self) -> Result<Option<Arc<dyn ScaleProvider>>> {
        let provider: Arc<dyn ScaleProvider> = if let Some(width) = self.width {
            Arc::new(WidthScaler::new(width)?)
        } else if let Some(height) = self.height {
            Arc::new(HeightScaler::new(height)?)
        } else if let Some((width, height)) = self.size {
            Arc::new(SizeScaler::new(width, height)?)
        } else if let Some(multiplier) = self.multiply {
            Arc::new(MultiplyScaler::new(multiplier)?)
        } else if let Some((width, height)) = self.bounds {
            Arc::new(BoundsScaler::new(width, height)?)
        } else if let Some((width, height)) = self.fit {
            Arc::new(FitBoundsScaler::new(width, height)?)
        } else {
            return Ok(None);
        };
        Ok(Some(provider))
    }
}

impl ExtractArgs {
    fn crop_provider(&self) -> Result<Option<Arc<dyn CropProvider>>> {
        let Some((width, height)) = self.crop else {
            return Ok(None);
        };

        let cropper = match (self.offset, self.align) {
            (Some((x, y)), _) => SizeCropper::with_offset(width, height, x, y)?,
            (None, Some(align)) => SizeCropper::with_align(width, height, align)?,
            (None, None) => SizeCropper::new(width, height)?,
        };
        Ok(Some(Arc::new(cropper)))
    }

    /// `--format`, else the output's extension, else the configured default
    fn image_format(&self, config: &Config) -> Result<ImageFormat> {
        if let Some(ref format) = self.format {
            return Ok(ImageFormat::from_extension(format)?);
        }

        let from_output = self
            .output
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ImageFormat::from_extension(ext).ok());
        match from_output {
            Some(format) => Ok(format),
            None => config.default_image_format(),
        }
    }

    fn modifiers(&self, config: &Config) -> Result<FrameExtractionModifiers> {
        let modifiers = FrameExtractionModifiers::new();
        modifiers.set_seek_time(self.time);
        modifiers.set_scale(self.scale.provider()?);
        modifiers.set_crop(self.crop_provider()?);
        if self.crop_first {
            modifiers.set_order(ScaleCropOrder::CropFirst);
        }
        modifiers.set_image_format(Some(self.image_format(config)?));
        Ok(modifiers)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file and applies command line overrides
async fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).await?,
        None => match Config::default_path() {
            Ok(path) => Config::from_file(&path).await?,
            Err(e) => {
                debug!("No config directory, using defaults: {}", e);
                Config::default()
            }
        },
    };

    if cli.ffmpeg.is_some() {
        config.ffmpeg_path = cli.ffmpeg.clone();
    }
    config.json_output |= cli.json;
    config.validate()?;
    Ok(config)
}

fn spinner(config: &Config, message: &str) -> ProgressBar {
    if config.json_output {
        ProgressManager::hidden()
    } else {
        ProgressManager::spinner(message)
    }
}

async fn run(command: &Command, config: &Config) -> Result<()> {
    let progress = spinner(config, "Locating ffmpeg");
    let servicer = FfmpegServicer::locate(config.servicer_location()).await;
    progress.finish_and_clear();
    let servicer = servicer?.with_read_buffer_size(config.read_buffer_size);

    match command {
        Command::Check => {
            if config.json_output {
                JsonMessage::tool(servicer.location().to_path_buf()).emit();
            } else {
                println!("ffmpeg: {}", servicer.location().display());
            }
            Ok(())
        }
        Command::Info { video } => show_info(&FrameGrabber::new(servicer), video, config).await,
        Command::Extract(args) => extract(&FrameGrabber::new(servicer), args, config).await,
    }
}

async fn show_info(grabber: &FrameGrabber, video: &Path, config: &Config) -> Result<()> {
    let progress = spinner(config, &format!("Reading {}", video.display()));
    let metadata = grabber.metadata(video).await;
    progress.finish_and_clear();
    let metadata = metadata?;

    if config.json_output {
        JsonMessage::metadata(video.to_path_buf(), &metadata).emit();
    } else {
        println!(
            "{}: {}x{}, {}",
            video.display(),
            metadata.width,
            metadata.height,
            format_timestamp(metadata.duration)
        );
    }
    Ok(())
}

async fn extract(grabber: &FrameGrabber, args: &ExtractArgs, config: &Config) -> Result<()> {
    let modifiers = args.modifiers(config)?;

    let progress = spinner(
        config,
        &format!(
            "Extracting frame at {} from {}",
            format_timestamp(args.time),
            args.video.display()
        ),
    );
    let plan = grabber
        .extract_frame_to_file(&args.video, &args.output, &modifiers)
        .await;
    progress.finish_and_clear();
    let plan = plan?;

    let size = tokio::fs::metadata(&args.output)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    if config.json_output {
        JsonMessage::extracted(
            args.video.clone(),
            args.output.clone(),
            plan.format.extension(),
            plan.seek_time.as_secs_f64(),
            size,
        )
        .emit();
    } else {
        if !plan.filters.is_empty() {
            info!("Filters: {}", plan.filters.join(","));
        }
        println!(
            "Saved frame at {} to {} ({})",
            format_timestamp(plan.seek_time),
            args.output.display(),
            format_size(size)
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = load_config(&cli).await?;

    match run(&cli.command, &config).await {
        Err(e) if config.json_output => {
            JsonMessage::from_error(&e).emit();
            std::process::exit(1);
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_grabber::ScaleParameters;

    fn extract_args(extra: &[&str]) -> ExtractArgs {
        let mut argv = vec!["frame-grabber", "extract", "clip.mp4", "-o", "out.png"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Extract(args) => args,
            _ => panic!("expected the extract subcommand"),
        }
    }

    fn scaled(extra: &[&str], width: i32, height: i32) -> Option<ScaleParameters> {
        let provider = extract_args(extra).scale.provider().unwrap();
        provider.map(|p| p.scale_parameters(width, height))
    }

    #[test]
    fn test_fit_enlarges_to_touch_bounds() {
        assert_eq!(
            scaled(&["--fit", "1000x1000"], 100, 50),
            Some(ScaleParameters { width: 1000, height: 500 })
        );
        assert_eq!(
            scaled(&["--fit", "100x100"], 400, 200),
            Some(ScaleParameters { width: 100, height: 50 })
        );
    }

    #[test]
    fn test_bounds_never_enlarges() {
        assert_eq!(
            scaled(&["--bounds", "1000x1000"], 100, 50),
            Some(ScaleParameters { width: 100, height: 50 })
        );
        assert_eq!(
            scaled(&["--bounds", "100x100"], 400, 200),
            Some(ScaleParameters { width: 100, height: 50 })
        );
    }

    #[test]
    fn test_scale_flags() {
        assert_eq!(scaled(&[], 100, 50), None);
        assert_eq!(
            scaled(&["--width", "50"], 100, 50),
            Some(ScaleParameters { width: 50, height: 25 })
        );
        assert_eq!(
            scaled(&["--size", "64x48"], 100, 50),
            Some(ScaleParameters { width: 64, height: 48 })
        );
    }

    #[test]
    fn test_scale_flags_are_exclusive() {
        let argv = [
            "frame-grabber", "extract", "clip.mp4", "-o", "out.png", "--width", "50", "--fit",
            "100x100",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
