//! # Engine Path Resolver
//!
//! Finds the transcoding engine binary in the places it can live:
//! - Explicit override via the `VIDEO_CONVERTER_FFMPEG` environment variable
//! - A path set in the configuration file
//! - The system `PATH`

use crate::error::ConvertError;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable that overrides every other lookup
pub const ENGINE_ENV_VAR: &str = "VIDEO_CONVERTER_FFMPEG";

/// Name of the engine binary looked up in `PATH`
pub const ENGINE_BINARY: &str = "ffmpeg";

/// Tool path resolver for the transcoding engine
#[derive(Debug, Default)]
pub struct ToolPathResolver {
    /// Path taken from the configuration, checked after the env override
    configured: Option<PathBuf>,
    /// Search path, `None` means read `PATH` at resolve time
    search_path: Option<Vec<PathBuf>>,
}

impl ToolPathResolver {
    /// Create a new path resolver
    pub fn new(configured: Option<PathBuf>) -> Self {
        Self {
            configured,
            search_path: None,
        }
    }

    /// Use a fixed list of directories instead of `PATH`
    pub fn with_search_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_path = Some(dirs);
        self
    }

    /// Resolve the engine, or fail with install instructions
    pub fn resolve_engine(&self) -> Result<PathBuf, ConvertError> {
        self.resolve_with_override(env::var_os(ENGINE_ENV_VAR).map(PathBuf::from))
    }

    fn resolve_with_override(&self, env_override: Option<PathBuf>) -> Result<PathBuf, ConvertError> {
        if let Some(path) = env_override {
            debug!("Checking {}: {:?}", ENGINE_ENV_VAR, path);
            if is_executable_file(&path) {
                return Ok(path);
            }
            warn!("{} is not an executable file: {}", ENGINE_ENV_VAR, path.display());
        }

        if let Some(ref path) = self.configured {
            debug!("Checking configured engine path: {:?}", path);
            if is_executable_file(path) {
                return Ok(path.clone());
            }
            warn!("Configured engine path is not an executable file: {}", path.display());
        }

        if let Some(path) = self.find_in_system_path(ENGINE_BINARY) {
            debug!("Using system tool: {} -> {:?}", ENGINE_BINARY, path);
            return Ok(path);
        }

        Err(ConvertError::EngineNotFound(format!(
            "{} not found in PATH. Install it ({}) or set {}",
            ENGINE_BINARY,
            install_instructions(),
            ENGINE_ENV_VAR
        )))
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let extension = if cfg!(windows) { ".exe" } else { "" };
        let tool_with_ext = format!("{}{}", tool_name, extension);

        let dirs = match self.search_path {
            Some(ref dirs) => dirs.clone(),
            None => env::split_paths(&env::var_os("PATH")?).collect(),
        };

        dirs.into_iter()
            .map(|dir| dir.join(&tool_with_ext))
            .find(|path| is_executable_file(path))
    }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

/// Installation hint for the current platform
fn install_instructions() -> &'static str {
    if cfg!(target_os = "linux") {
        "sudo apt-get install ffmpeg"
    } else if cfg!(target_os = "macos") {
        "brew install ffmpeg"
    } else {
        "https://ffmpeg.org/download.html"
    }
}
