//! # FFmpeg Servicer Module
//!
//! Owns one validated ffmpeg executable and every way the library talks to it.
//!
//! ## Responsibilities:
//! - Resolve the executable (`tool_resolver`) and check that it really is ffmpeg
//! - Run ffmpeg and throw its output away (`run_discarding_output`)
//! - Run ffmpeg and collect its stdout (`run_capturing_output`)
//! - Read a video's duration and resolution (`get_metadata`)
//!
//! ## Error signal:
//! Every run is prefixed with `-loglevel error`. At that level ffmpeg prints
//! nothing on success, so any stderr text at all is reported as
//! `GrabError::FFmpeg` carrying that text. The check happens only after both
//! pipes are drained and the process has exited.
//!
//! ## Pipes:
//! When stdout is captured, stderr is drained by a background task while
//! stdout is read in the calling task. Reading them one after the other can
//! deadlock once ffmpeg fills the pipe nobody is reading. The background task
//! is joined before returning and aborted if the call is dropped early.
//!
//! ## Validation:
//! The candidate is started without arguments and the first stderr line must
//! contain `ffmpeg`. This only rules out pointing at some unrelated program.
//!
//! ## Example:
//! ```rust,ignore
//! let servicer = FfmpegServicer::from_system().await?;
//! let info = servicer.get_metadata("clip.mp4").await?;
//! let png = servicer
//!     .run_capturing_output(&args![
//!         "-i", "clip.mp4", "-frames:v", "1", "-c:v", "png", "-f", "image2pipe", "-"
//!     ])
//!     .await?;
//! ```

use crate::error::{GrabError, Result};
use crate::metadata::{MetadataScanner, VideoMetadata};
use crate::tool_resolver::{resolve_location, ToolLocation};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Arguments placed in front of every caller supplied argument list
pub const LOG_LEVEL_ARGS: [&str; 2] = ["-loglevel", "error"];

/// Substring the first stderr line of a bare ffmpeg run must contain
pub const VALIDATION_MARKER: &str = "ffmpeg";

/// Default chunk size for reading ffmpeg's stdout
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Builds the command used to start a program.
///
/// This is the one seam between the servicer and the OS. Tests swap it for a
/// runner that starts fake tools through a shell.
pub trait ToolRunner: Send + Sync {
    fn command(&self, program: &Path) -> Command;
}

/// Starts programs directly
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn command(&self, program: &Path) -> Command {
        Command::new(program)
    }
}

/// Reads a pipe to the end on a separate task.
///
/// Dropping the guard aborts the task, so it cannot outlive the call that
/// spawned it.
struct DrainTask {
    handle: JoinHandle<io::Result<Vec<u8>>>,
}

impl DrainTask {
    fn spawn<R>(mut reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut buffer = Vec::new();
            reader.read_to_end(&mut buffer).await?;
            Ok(buffer)
        });
        Self { handle }
    }

    async fn join(mut self) -> Result<Vec<u8>> {
        let joined = (&mut self.handle).await.map_err(io::Error::other)?;
        Ok(joined?)
    }
}

impl Drop for DrainTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Turns collected stderr bytes into the error policy of the servicer
fn check_diagnostics(diagnostics: &[u8]) -> Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    let text = String::from_utf8_lossy(diagnostics).into_owned();
    warn!("FFmpeg reported an error: {}", text.trim_end());
    Err(GrabError::FFmpeg(text))
}

/// Starts `candidate` without arguments and checks its first stderr line
async fn probe(runner: &dyn ToolRunner, candidate: &Path) -> bool {
    let mut cmd = runner.command(candidate);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!("Could not start {:?}: {}", candidate, e);
            return false;
        }
    };

    let first_line = match child.stderr.take() {
        Some(stderr) => BufReader::new(stderr).lines().next_line().await.ok().flatten(),
        None => None,
    };
    debug!("Validation output of {:?}: {:?}", candidate, first_line);

    // The banner is all we need
    let _ = child.start_kill();
    let _ = child.wait().await;

    first_line.is_some_and(|line| line.contains(VALIDATION_MARKER))
}

/// Servicer bound to one validated ffmpeg executable.
///
/// Immutable after construction; clones share the runner.
#[derive(Clone)]
pub struct FfmpegServicer {
    location: PathBuf,
    runner: Arc<dyn ToolRunner>,
    read_buffer_size: usize,
}

impl fmt::Debug for FfmpegServicer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FfmpegServicer")
            .field("location", &self.location)
            .field("read_buffer_size", &self.read_buffer_size)
            .finish_non_exhaustive()
    }
}

impl FfmpegServicer {
    /// Uses the ffmpeg file at `ffmpeg_path`, or the one inside that directory.
    ///
    /// # Errors
    /// - `NullArgument` when `ffmpeg_path` is `None`
    /// - `InvalidArgument` when it is empty or whitespace
    /// - `NotFound` when no file exists at the resolved location
    /// - `InvalidFormat` when the file does not behave like ffmpeg
    pub async fn new(ffmpeg_path: Option<&str>) -> Result<Self> {
        let ffmpeg_path =
            ffmpeg_path.ok_or_else(|| GrabError::NullArgument("ffmpeg path".to_string()))?;
        Self::locate(ToolLocation::Path(ffmpeg_path.to_string())).await
    }

    /// Uses the ffmpeg found on the system `PATH`
    pub async fn from_system() -> Result<Self> {
        Self::locate(ToolLocation::System).await
    }

    pub async fn locate(location: ToolLocation) -> Result<Self> {
        Self::with_runner(location, Arc::new(SystemRunner)).await
    }

    /// Resolves and validates `location`, starting processes through `runner`
    pub async fn with_runner(location: ToolLocation, runner: Arc<dyn ToolRunner>) -> Result<Self> {
        let candidate = resolve_location(&location)?;

        if !probe(runner.as_ref(), &candidate).await {
            warn!("{} is not a valid ffmpeg executable", candidate.display());
            return Err(GrabError::InvalidFormat(format!(
                "{} is not a valid ffmpeg executable",
                candidate.display()
            )));
        }

        info!("Using ffmpeg at {}", candidate.display());
        Ok(Self {
            location: candidate,
            runner,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        })
    }

    /// Chunk size used when reading stdout; zero is raised to one
    pub fn with_read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size.max(1);
        self
    }

    /// Absolute path of the ffmpeg executable
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    fn command(&self, args: &[String]) -> Command {
        debug!("ffmpeg {} {}", LOG_LEVEL_ARGS.join(" "), args.join(" "));

        let mut cmd = self.runner.command(&self.location);
        cmd.args(LOG_LEVEL_ARGS)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Runs ffmpeg for its side effects (e.g. writing a file).
    ///
    /// Fails with `GrabError::FFmpeg` if anything was written to stderr.
    pub async fn run_discarding_output(&self, args: &[String]) -> Result<()> {
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());
        let mut child = cmd.spawn()?;

        let mut diagnostics = Vec::new();
        if let Some(mut stderr) = child.stderr.take() {
            stderr.read_to_end(&mut diagnostics).await?;
        }

        let status = child.wait().await?;
        debug!("ffmpeg exited with {}", status);

        check_diagnostics(&diagnostics)
    }

    /// Runs ffmpeg and returns everything it wrote to stdout (possibly nothing).
    ///
    /// Fails with `GrabError::FFmpeg` if anything was written to stderr.
    pub async fn run_capturing_output(&self, args: &[String]) -> Result<Vec<u8>> {
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let mut child = cmd.spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("ffmpeg stderr was not captured"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("ffmpeg stdout was not captured"))?;

        let stderr_drain = DrainTask::spawn(stderr);

        let mut output = Vec::new();
        let mut chunk = vec![0u8; self.read_buffer_size];
        loop {
            let read = stdout.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            output.extend_from_slice(&chunk[..read]);
        }

        let diagnostics = stderr_drain.join().await?;
        let status = child.wait().await?;
        debug!("ffmpeg exited with {} after writing {} bytes", status, output.len());

        check_diagnostics(&diagnostics)?;
        Ok(output)
    }

    /// Reads the duration and resolution of the video at `video_path`.
    ///
    /// # Errors
    /// - `InvalidArgument` when the path is blank
    /// - `MetadataUnavailable` when ffmpeg's output ends before both values
    ///   were found (missing file, not a video, ...)
    pub async fn get_metadata(&self, video_path: impl AsRef<Path>) -> Result<VideoMetadata> {
        let video_path = video_path.as_ref();
        if video_path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(GrabError::InvalidArgument(
                "no video path specified (path was empty)".to_string(),
            ));
        }

        let mut cmd = self.runner.command(&self.location);
        cmd.arg("-hide_banner")
            .arg("-i")
            .arg(video_path)
            .args(["-f", "ffmetadata", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!("Reading metadata of {}", video_path.display());
        let mut child = cmd.spawn()?;

        let mut scanner = MetadataScanner::new();
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr);
            let mut raw_line = Vec::new();
            loop {
                raw_line.clear();
                if reader.read_until(b'\n', &mut raw_line).await? == 0 {
                    break;
                }
                if scanner.feed(&String::from_utf8_lossy(&raw_line)) {
                    break;
                }
            }
        }

        if scanner.is_complete() {
            // Nobody reads the rest of the dump
            let _ = child.start_kill();
        }
        child.wait().await?;

        match scanner.finish() {
            Some(metadata) => {
                debug!(
                    "Metadata of {}: {}x{}, {:?}",
                    video_path.display(),
                    metadata.width,
                    metadata.height,
                    metadata.duration
                );
                Ok(metadata)
            }
            None => Err(GrabError::MetadataUnavailable(format!(
                "could not get metadata info from the video at {}",
                video_path.display()
            ))),
        }
    }
}
