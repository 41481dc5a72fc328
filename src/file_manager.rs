//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file video e alcune utilità sui file.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva dei video in una directory
//! - Gestione del caso "path singolo" (il batch è quel file)
//! - Formattazione human-readable delle dimensioni
//!
//! ## Ordine di discovery:
//! I file vengono ordinati per path, così l'elaborazione sequenziale è
//! deterministica tra esecuzioni diverse.
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::discover(Path::new("/videos"), &config)?;
//! ```

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Collect the batch for `root`: the file itself, or every supported video below it
    pub fn discover(root: &Path, config: &ConversionConfig) -> Result<Vec<PathBuf>, ConvertError> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        if !root.is_dir() {
            return Err(ConvertError::InvalidInput(format!(
                "Path does not exist: {}",
                root.display()
            )));
        }

        Ok(Self::find_video_files(root, config))
    }

    /// Find all supported video files in a directory, sorted by path
    pub fn find_video_files(video_dir: &Path, config: &ConversionConfig) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(video_dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if config.is_source_file(path) {
                files.push(path.to_path_buf());
            } else {
                debug!("Ignoring non-video file: {}", path.display());
            }
        }

        files.sort();
        files
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
