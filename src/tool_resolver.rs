//! # FFmpeg Path Resolver
//!
//! This module turns a user supplied location into the absolute path of an
//! ffmpeg executable:
//! - System-installed ffmpeg found through `PATH`
//! - A directory that contains the ffmpeg executable
//! - A direct path to the executable file
//!
//! Only existence is checked here. Whether the file really is ffmpeg is
//! decided by the servicer, which runs it.

use crate::error::{GrabError, Result};
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Base name of the executable looked up in directories and on `PATH`
pub const FFMPEG_TOOL_NAME: &str = "ffmpeg";

/// Where to look for ffmpeg
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolLocation {
    /// Search the host's standard executable locations (`PATH`)
    System,
    /// A file path or a directory holding the executable
    Path(String),
}

/// File name of a tool on this platform (`ffmpeg.exe` on Windows)
pub fn executable_name(tool_name: &str) -> String {
    format!("{}{}", tool_name, env::consts::EXE_SUFFIX)
}

/// Find a tool in the system PATH
pub fn find_in_system_path(tool_name: &str) -> Option<PathBuf> {
    find_in_paths(tool_name, &env::var_os("PATH")?)
}

/// Find a tool in a `PATH`-style list of directories. Empty entries are skipped.
pub fn find_in_paths(tool_name: &str, search_path: &OsStr) -> Option<PathBuf> {
    let tool_with_ext = executable_name(tool_name);

    env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(&tool_with_ext))
        .find(|path| path.is_file())
}

fn linux_install_hint(tool_name: &str) -> String {
    match tool_name {
        "ffmpeg" | "ffprobe" => "sudo apt-get install ffmpeg".to_string(),
        _ => format!("sudo apt-get install {}", tool_name),
    }
}

/// Resolves `location` to the absolute path of an existing file.
///
/// Order: `PATH` search when asked for, otherwise the path is tried as a
/// directory containing the executable, then as the executable itself.
pub fn resolve_location(location: &ToolLocation) -> Result<PathBuf> {
    let found = match location {
        ToolLocation::System => resolve_from_system()?,
        ToolLocation::Path(raw) => resolve_from_path(raw)?,
    };

    let absolute = found.canonicalize()?;
    debug!("Resolved ffmpeg location: {:?}", absolute);
    Ok(absolute)
}

fn resolve_from_system() -> Result<PathBuf> {
    resolve_in_search_path(&env::var_os("PATH").unwrap_or_default())
}

fn resolve_in_search_path(search_path: &OsStr) -> Result<PathBuf> {
    if let Some(path) = find_in_paths(FFMPEG_TOOL_NAME, search_path) {
        debug!("Found system ffmpeg: {:?}", path);
        return Ok(path);
    }

    warn!("Tool not found in PATH: {}", FFMPEG_TOOL_NAME);
    let message = if cfg!(target_os = "linux") {
        format!(
            "could not find a shared {} in the system PATH (install with: {})",
            executable_name(FFMPEG_TOOL_NAME),
            linux_install_hint(FFMPEG_TOOL_NAME)
        )
    } else {
        format!(
            "could not find a shared {} in the system PATH",
            executable_name(FFMPEG_TOOL_NAME)
        )
    };
    Err(GrabError::NotFound(message))
}

fn resolve_from_path(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GrabError::InvalidArgument(
            "no ffmpeg path specified (path was empty)".to_string(),
        ));
    }

    let path = Path::new(trimmed);
    if path.is_dir() {
        let in_directory = path.join(executable_name(FFMPEG_TOOL_NAME));
        debug!("Checking directory for ffmpeg: {:?}", in_directory);
        if !in_directory.is_file() {
            return Err(GrabError::NotFound(format!(
                "directory {} does not contain {}",
                path.display(),
                executable_name(FFMPEG_TOOL_NAME)
            )));
        }
        return Ok(in_directory);
    }

    if !path.is_file() {
        return Err(GrabError::NotFound(format!(
            "could not find the ffmpeg file {}",
            path.display()
        )));
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blank_path_is_invalid() {
        for raw in ["", "   ", "\t\n"] {
            let result = resolve_location(&ToolLocation::Path(raw.to_string()));
            assert!(matches!(result, Err(GrabError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("no-such-ffmpeg");
        let result = resolve_location(&ToolLocation::Path(missing.display().to_string()));
        assert!(matches!(result, Err(GrabError::NotFound(_))));
    }

    #[test]
    fn test_directory_without_ffmpeg_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = resolve_location(&ToolLocation::Path(temp_dir.path().display().to_string()));
        assert!(matches!(result, Err(GrabError::NotFound(_))));
    }

    #[test]
    fn test_directory_with_ffmpeg_resolves_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let exe = temp_dir.path().join(executable_name(FFMPEG_TOOL_NAME));
        std::fs::write(&exe, b"").unwrap();

        let raw = format!("  {}  ", temp_dir.path().display());
        let resolved = resolve_location(&ToolLocation::Path(raw)).unwrap();
        assert_eq!(resolved, exe.canonicalize().unwrap());
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_direct_file_resolves() {
        let temp_dir = TempDir::new().unwrap();
        let exe = temp_dir.path().join("my-ffmpeg-build");
        std::fs::write(&exe, b"").unwrap();

        let resolved = resolve_location(&ToolLocation::Path(exe.display().to_string())).unwrap();
        assert_eq!(resolved, exe.canonicalize().unwrap());
    }

    #[test]
    fn test_search_path_finds_ffmpeg_after_missing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let exe = temp_dir.path().join(executable_name(FFMPEG_TOOL_NAME));
        std::fs::write(&exe, b"").unwrap();

        let missing = temp_dir.path().join("missing");
        let search_path = env::join_paths([missing.as_path(), temp_dir.path()]).unwrap();
        assert_eq!(find_in_paths(FFMPEG_TOOL_NAME, &search_path), Some(exe.clone()));
        assert_eq!(resolve_in_search_path(&search_path).unwrap(), exe);
    }

    #[test]
    fn test_search_path_without_ffmpeg_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let search_path = env::join_paths([temp_dir.path()]).unwrap();
        assert_eq!(find_in_paths(FFMPEG_TOOL_NAME, &search_path), None);

        match resolve_in_search_path(OsStr::new("")) {
            Err(GrabError::NotFound(message)) => {
                assert!(message.contains(&executable_name(FFMPEG_TOOL_NAME)));
                if cfg!(target_os = "linux") {
                    assert!(message.contains("apt-get install ffmpeg"));
                }
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_executable_name() {
        let name = executable_name("ffmpeg");
        assert!(name.starts_with("ffmpeg"));
        if cfg!(windows) {
            assert_eq!(name, "ffmpeg.exe");
        }
    }
}
