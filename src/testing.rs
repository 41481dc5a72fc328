//! Scripted engine for unit tests.

use crate::engine::{EngineCommand, EngineOutput, TranscodeEngine};
use crate::error::ConvertError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// What the mock does for one kind of invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Exit 0 and write a non-empty output
    Succeed,
    /// Exit non-zero after writing some partial bytes
    Fail,
    /// Exit 0 without writing anything
    Empty,
    /// Report a timeout
    Timeout,
    /// Panic inside the engine call
    Panic,
}

pub struct MockEngine {
    remux: Step,
    reencode: Step,
    failing_stems: Vec<String>,
    panicking_stems: Vec<String>,
    delay: Duration,
    calls: Mutex<Vec<EngineCommand>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            remux: Step::Succeed,
            reencode: Step::Succeed,
            failing_stems: Vec::new(),
            panicking_stems: Vec::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn remux(mut self, step: Step) -> Self {
        self.remux = step;
        self
    }

    pub fn reencode(mut self, step: Step) -> Self {
        self.reencode = step;
        self
    }

    /// Both invocations fail for sources with this file stem
    pub fn failing_for(mut self, stem: &str) -> Self {
        self.failing_stems.push(stem.to_string());
        self
    }

    /// The engine call panics for sources with this file stem
    pub fn panicking_for(mut self, stem: &str) -> Self {
        self.panicking_stems.push(stem.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<EngineCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remux_calls(&self) -> usize {
        self.calls().iter().filter(|c| c.is_stream_copy()).count()
    }

    pub fn reencode_calls(&self) -> usize {
        self.calls().iter().filter(|c| !c.is_stream_copy()).count()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn step_for(&self, command: &EngineCommand) -> Step {
        let stem = command
            .input()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.panicking_stems.contains(&stem) {
            Step::Panic
        } else if self.failing_stems.contains(&stem) {
            Step::Fail
        } else if command.is_stream_copy() {
            self.remux
        } else {
            self.reencode
        }
    }
}

#[async_trait]
impl TranscodeEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, command: &EngineCommand) -> Result<EngineOutput, ConvertError> {
        self.calls.lock().unwrap().push(command.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let output = |success: bool, stderr: &str| EngineOutput {
            success,
            stderr: stderr.to_string(),
            elapsed: self.delay,
        };

        match self.step_for(command) {
            Step::Succeed => {
                tokio::fs::write(command.output(), b"converted").await?;
                Ok(output(true, ""))
            }
            Step::Fail => {
                tokio::fs::write(command.output(), b"partial").await?;
                Ok(output(false, "mock engine failure"))
            }
            Step::Empty => Ok(output(true, "")),
            Step::Timeout => Err(ConvertError::Timeout { seconds: 1 }),
            Step::Panic => panic!("mock engine panic"),
        }
    }
}

/// Create `name` under `dir` with some bytes in it
pub fn touch(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, b"source video").unwrap();
    path
}

/// Files in `dir` (non-recursive), sorted by name
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
