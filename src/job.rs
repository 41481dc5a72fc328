//! Request and result types exchanged between the front doors, the
//! batch runner and the converter.

use crate::formats;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Encoders that replace the configured defaults for the re-encode attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncoderOverrides {
    pub video: Option<String>,
    pub audio: Option<String>,
}

/// One file to convert. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    source: PathBuf,
    target_format: String,
    encoders: EncoderOverrides,
}

impl ConversionRequest {
    pub fn new(source: impl Into<PathBuf>, target_format: &str) -> Self {
        Self {
            source: source.into(),
            target_format: formats::normalize(target_format),
            encoders: EncoderOverrides::default(),
        }
    }

    pub fn with_encoders(self, encoders: EncoderOverrides) -> Self {
        Self { encoders, ..self }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    pub fn encoders(&self) -> &EncoderOverrides {
        &self.encoders
    }
}

/// How a conversion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// Source already in the target container
    Skipped,
    /// Stream copy into the new container succeeded
    FastPath,
    /// Stream copy failed, re-encode succeeded
    Reencoded,
    Failed,
}

impl ConversionOutcome {
    /// Outcomes that produced a new file
    pub fn is_converted(self) -> bool {
        matches!(self, Self::FastPath | Self::Reencoded)
    }

    /// Status tag used in per-file lines
    pub fn tag(self) -> &'static str {
        match self {
            Self::Skipped => "SKIP",
            Self::FastPath => "OK",
            Self::Reencoded => "OK",
            Self::Failed => "FAIL",
        }
    }
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Skipped => "skipped",
            Self::FastPath => "fast-path",
            Self::Reencoded => "re-encoded",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Final record for one request. Built once through the constructors below.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    source: PathBuf,
    output: Option<PathBuf>,
    outcome: ConversionOutcome,
    error: Option<String>,
    #[serde(rename = "elapsed_seconds", serialize_with = "serialize_secs")]
    elapsed: Duration,
}

fn serialize_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

impl ConversionResult {
    pub fn skipped(source: &Path, elapsed: Duration) -> Self {
        Self {
            source: source.to_path_buf(),
            output: None,
            outcome: ConversionOutcome::Skipped,
            error: None,
            elapsed,
        }
    }

    pub fn converted(source: &Path, output: PathBuf, outcome: ConversionOutcome, elapsed: Duration) -> Self {
        debug_assert!(outcome.is_converted());
        Self {
            source: source.to_path_buf(),
            output: Some(output),
            outcome,
            error: None,
            elapsed,
        }
    }

    pub fn failed(source: &Path, error: impl fmt::Display, elapsed: Duration) -> Self {
        Self {
            source: source.to_path_buf(),
            output: None,
            outcome: ConversionOutcome::Failed,
            error: Some(error.to_string()),
            elapsed,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn outcome(&self) -> ConversionOutcome {
        self.outcome
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == ConversionOutcome::Failed
    }

    /// One line for the CLI report
    pub fn status_line(&self) -> String {
        let name = self.source.display();
        match (self.outcome, &self.output, &self.error) {
            (ConversionOutcome::Skipped, _, _) => {
                format!("[SKIP] {}: already in target format", name)
            }
            (ConversionOutcome::Failed, _, error) => format!(
                "[FAIL] {}: {}",
                name,
                error.as_deref().unwrap_or("conversion failed")
            ),
            (outcome, Some(output), _) => format!(
                "[{}] {} -> {} ({}, {:.2}s)",
                outcome.tag(),
                name,
                output.display(),
                outcome,
                self.elapsed.as_secs_f64()
            ),
            (outcome, None, _) => format!("[{}] {}", outcome.tag(), name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_normalizes_format() {
        let request = ConversionRequest::new("/v/movie.mkv", " .MP4");
        assert_eq!(request.target_format(), "mp4");
        assert_eq!(request.source(), Path::new("/v/movie.mkv"));
        assert_eq!(request.encoders(), &EncoderOverrides::default());
    }

    #[test]
    fn test_request_with_encoders() {
        let request = ConversionRequest::new("a.avi", "webm").with_encoders(EncoderOverrides {
            video: Some("libvpx-vp9".into()),
            audio: None,
        });
        assert_eq!(request.encoders().video.as_deref(), Some("libvpx-vp9"));
        assert_eq!(request.encoders().audio, None);
    }

    #[test]
    fn test_status_lines() {
        let src = Path::new("movie.mkv");
        let ok = ConversionResult::converted(
            src,
            PathBuf::from("movie_20240101_120000.mp4"),
            ConversionOutcome::FastPath,
            Duration::from_millis(1500),
        );
        assert_eq!(
            ok.status_line(),
            "[OK] movie.mkv -> movie_20240101_120000.mp4 (fast-path, 1.50s)"
        );

        let skipped = ConversionResult::skipped(src, Duration::ZERO);
        assert!(skipped.status_line().starts_with("[SKIP]"));
        assert!(skipped.output().is_none());

        let failed = ConversionResult::failed(src, "Re-encode failed: bad data", Duration::ZERO);
        assert_eq!(failed.status_line(), "[FAIL] movie.mkv: Re-encode failed: bad data");
        assert!(failed.is_failure());
    }

    #[test]
    fn test_result_serializes_outcome_tag() {
        let result = ConversionResult::failed(Path::new("x.avi"), "boom", Duration::from_secs(2));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["elapsed_seconds"], 2.0);
    }
}
