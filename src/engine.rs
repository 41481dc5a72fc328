//! # Transcoding Engine Module
//!
//! Questo modulo incapsula l'invocazione del motore di transcodifica esterno (ffmpeg).
//!
//! ## Responsabilità:
//! - Costruzione tipizzata degli argomenti (nessuna shell, nessuna stringa concatenata)
//! - Due invocazioni: remux con stream copy e ricodifica con encoder espliciti
//! - Esecuzione asincrona del processo con cattura di stderr
//! - Timeout rigido per invocazione, con kill del processo figlio
//!
//! ## Contratto con ffmpeg:
//! - **Remux**: `-i <src> -c copy -y <out>`
//! - **Ricodifica**: `-i <src> -c:v <video> -c:a <audio> -y <out>`
//!
//! Il trait `TranscodeEngine` è il punto di aggancio per i test: il converter
//! non sa se sta parlando con ffmpeg o con un motore simulato.

use crate::engine_args;
use crate::error::ConvertError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Flags shared by every invocation
const COMMON_ARGS: &[&str] = &["-hide_banner", "-nostdin", "-loglevel", "error"];

/// How streams are carried into the new container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMode {
    /// Stream copy, no frames are encoded
    Copy,
    /// Decode and re-compress with the named encoders
    Reencode { video: String, audio: String },
}

/// A single engine invocation, turned into an argument vector by [`EngineCommand::args`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    input: PathBuf,
    output: PathBuf,
    mode: StreamMode,
}

impl EngineCommand {
    /// Remux `input` into `output` without re-encoding
    pub fn remux(input: &Path, output: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            mode: StreamMode::Copy,
        }
    }

    /// Re-encode `input` into `output` with the given encoders
    pub fn reencode(input: &Path, output: &Path, video: &str, audio: &str) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            mode: StreamMode::Reencode {
                video: video.to_string(),
                audio: audio.to_string(),
            },
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn mode(&self) -> &StreamMode {
        &self.mode
    }

    pub fn is_stream_copy(&self) -> bool {
        self.mode == StreamMode::Copy
    }

    /// Argument vector passed to the engine binary
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = COMMON_ARGS.iter().map(OsString::from).collect();
        args.push("-i".into());
        args.push(self.input.as_os_str().to_owned());

        match &self.mode {
            StreamMode::Copy => args.extend(engine_args!["-c", "copy"]),
            StreamMode::Reencode { video, audio } => {
                args.extend(engine_args!["-c:v", video, "-c:a", audio])
            }
        }

        // The output name is reserved up front, so overwriting our own placeholder is expected
        args.push("-y".into());
        args.push(self.output.as_os_str().to_owned());
        args
    }
}

/// What the engine reported for one invocation
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub success: bool,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Something that can execute an [`EngineCommand`]
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Human readable name, for logs
    fn name(&self) -> &str;

    /// Run one invocation to completion.
    ///
    /// A non-zero exit is reported through `EngineOutput::success`, not as `Err`.
    /// `Err` is reserved for spawn failures and timeouts.
    async fn run(&self, command: &EngineCommand) -> Result<EngineOutput, ConvertError>;
}

/// ffmpeg invoked as a child process
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegEngine {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn run(&self, command: &EngineCommand) -> Result<EngineOutput, ConvertError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), args = ?command.args(), "spawning engine");

        let start = Instant::now();
        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ConvertError::EngineNotFound(self.program.display().to_string())
            }
            _ => ConvertError::Io(e),
        })?;

        // Dropping the wait future on timeout drops the child, and kill_on_drop kills it
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ConvertError::Timeout {
                    seconds: limit.as_secs(),
                })??,
            None => child.wait_with_output().await?,
        };

        Ok(EngineOutput {
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_remux_args() {
        let cmd = EngineCommand::remux(Path::new("/in/movie.mkv"), Path::new("/out/movie_1.mp4"));
        assert!(cmd.is_stream_copy());
        assert_eq!(
            strings(&cmd.args()),
            vec![
                "-hide_banner", "-nostdin", "-loglevel", "error",
                "-i", "/in/movie.mkv",
                "-c", "copy",
                "-y", "/out/movie_1.mp4",
            ]
        );
    }

    #[test]
    fn test_reencode_args() {
        let cmd = EngineCommand::reencode(
            Path::new("clip.avi"),
            Path::new("clip_2.webm"),
            "libvpx-vp9",
            "libopus",
        );
        assert!(!cmd.is_stream_copy());
        let args = strings(&cmd.args());
        assert_eq!(&args[4..], &["-i", "clip.avi", "-c:v", "libvpx-vp9", "-c:a", "libopus", "-y", "clip_2.webm"]);
    }

    #[test]
    fn test_paths_with_spaces_stay_single_arguments() {
        let cmd = EngineCommand::remux(Path::new("my movie; rm -rf.mkv"), Path::new("out file.mp4"));
        let args = strings(&cmd.args());
        assert!(args.contains(&"my movie; rm -rf.mkv".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out file.mp4"));
    }

    #[tokio::test]
    async fn test_missing_program_is_engine_not_found() {
        let engine = FfmpegEngine::new("/definitely/not/here/ffmpeg", None);
        let cmd = EngineCommand::remux(Path::new("a.mkv"), Path::new("a.mp4"));
        let err = engine.run(&cmd).await.unwrap_err();
        assert!(matches!(err, ConvertError::EngineNotFound(_)));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn script(dir: &TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("fake-ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_success_and_failure_exit_codes() {
            let dir = TempDir::new().unwrap();
            let cmd = EngineCommand::remux(Path::new("a.mkv"), Path::new("a.mp4"));

            let ok = FfmpegEngine::new(script(&dir, "exit 0"), None);
            assert!(ok.run(&cmd).await.unwrap().success);

            let failing = FfmpegEngine::new(script(&dir, "echo 'codec not supported' >&2\nexit 1"), None);
            let output = failing.run(&cmd).await.unwrap();
            assert!(!output.success);
            assert_eq!(output.stderr, "codec not supported");
        }

        #[tokio::test]
        async fn test_timeout_kills_the_child() {
            let dir = TempDir::new().unwrap();
            let engine = FfmpegEngine::new(script(&dir, "sleep 30"), Some(Duration::from_millis(200)));
            let cmd = EngineCommand::remux(Path::new("a.mkv"), Path::new("a.mp4"));

            let start = Instant::now();
            let err = engine.run(&cmd).await.unwrap_err();
            assert!(matches!(err, ConvertError::Timeout { .. }));
            assert!(start.elapsed() < Duration::from_secs(10));
        }
    }
}
