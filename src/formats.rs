//! # Format Registry
//!
//! Elenco statico dei container riconosciuti e degli encoder di default.
//!
//! ## Responsabilità:
//! - Estensioni dei container supportati (sorgente e destinazione)
//! - Encoder video/audio usati quando il remux non è possibile
//! - MIME type per ogni container (usato dal front door web)
//! - Normalizzazione di formati ed estensioni (case-insensitive)

use std::path::Path;

/// Containers recognized both as sources and as targets
pub const SUPPORTED_FORMATS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "flv", "wmv", "webm", "mpeg", "m4v",
];

/// Target format used when none is given
pub const DEFAULT_FORMAT: &str = "mp4";

/// Video encoder for the re-encode fallback
pub const DEFAULT_VIDEO_ENCODER: &str = "libx264";

/// Audio encoder for the re-encode fallback
pub const DEFAULT_AUDIO_ENCODER: &str = "aac";

/// Normalize a user supplied format: trim, lowercase, drop a leading dot
pub fn normalize(format: &str) -> String {
    format.trim().trim_start_matches('.').to_lowercase()
}

/// Lowercased extension of a path, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Check whether the file at `path` already uses the `format` container
pub fn is_same_format(path: &Path, format: &str) -> bool {
    extension_of(path).is_some_and(|ext| ext == normalize(format))
}

/// MIME type served for a converted file
pub fn mime_type(format: &str) -> &'static str {
    match normalize(format).as_str() {
        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "webm" => "video/webm",
        "mpeg" => "video/mpeg",
        "m4v" => "video/x-m4v",
        _ => "application/octet-stream",
    }
}

/// Registry defaults as owned strings, for `ConversionConfig`
pub fn default_formats() -> Vec<String> {
    SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(" MP4 "), "mp4");
        assert_eq!(normalize(".mkv"), "mkv");
        assert_eq!(normalize("WebM"), "webm");
    }

    #[test]
    fn test_same_format_is_case_insensitive() {
        assert!(is_same_format(&PathBuf::from("/a/movie.MP4"), "mp4"));
        assert!(is_same_format(&PathBuf::from("clip.mkv"), ".MKV"));
        assert!(!is_same_format(&PathBuf::from("clip.mkv"), "mp4"));
        assert!(!is_same_format(&PathBuf::from("no_extension"), "mp4"));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type("mp4"), "video/mp4");
        assert_eq!(mime_type("MKV"), "video/x-matroska");
        assert_eq!(mime_type("gif"), "application/octet-stream");
    }

    #[test]
    fn test_every_format_has_a_mime_type() {
        for format in SUPPORTED_FORMATS {
            assert_ne!(mime_type(format), "application/octet-stream", "{}", format);
        }
    }
}
