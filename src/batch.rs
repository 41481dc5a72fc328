//! # Batch Conversion Orchestrator
//!
//! Orchestratore che converte tutti i video sotto un path.
//!
//! ## Responsabilità:
//! - Discovery dei file (delegata a `FileManager`)
//! - Pool di worker limitato da un semaforo con `max_workers` permessi
//! - Raccolta dei risultati e aggiornamento del progress tracker
//! - Messaggi di inizio/fine (log oppure JSON)
//!
//! ## Ordine dei risultati:
//! - **Parallelo**: ordine di completamento
//! - **Sequenziale**: ordine di discovery
//!
//! Un file che fallisce (o un task che va in panic) produce un risultato
//! `Failed` per quel file; il batch prosegue sempre.

use crate::{
    converter::Converter,
    error::ConvertError,
    file_manager::FileManager,
    formats,
    job::{ConversionRequest, ConversionResult},
    json_output::JsonMessage,
    progress::ConversionStats,
    progress_tracker::{ProgressMode, ProgressTracker},
};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{error, info};

/// Everything a batch produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<ConversionResult>,
    pub stats: ConversionStats,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.stats.has_failures()
    }
}

/// Runs one conversion per discovered file
pub struct BatchRunner {
    converter: Arc<Converter>,
    mode: ProgressMode,
}

impl BatchRunner {
    pub fn new(converter: Arc<Converter>, mode: ProgressMode) -> Self {
        Self { converter, mode }
    }

    /// Convert every video under `root` to `target_format`
    pub async fn run(
        &self,
        root: &Path,
        target_format: &str,
        parallel: bool,
        max_workers: usize,
    ) -> Result<BatchReport, ConvertError> {
        let start = Instant::now();
        let config = self.converter.config();
        let target = formats::normalize(target_format);

        if !config.supports(&target) {
            return Err(ConvertError::UnsupportedFormat(format!(
                "{} (supported: {})",
                target_format,
                config.supported_formats.join(", ")
            )));
        }

        let files = FileManager::discover(root, config)?;
        let workers = max_workers.max(1);
        let parallel = parallel && files.len() > 1;

        if self.mode == ProgressMode::Json {
            JsonMessage::start(root.to_path_buf(), &target, files.len(), config, parallel).emit();
        } else {
            self.log_configuration(root, &target, &files, parallel, workers);
        }

        if files.is_empty() {
            info!("No video files found in {}", root.display());
            return Ok(self.finish(Vec::new(), ConversionStats::new(), start.elapsed(), None));
        }

        let tracker = ProgressTracker::new(files.len(), self.mode);
        let results = if parallel {
            self.run_parallel(files, &target, workers, &tracker).await
        } else {
            self.run_sequential(files, &target, &tracker).await
        };

        let stats = tracker.stats().await;
        Ok(self.finish(results, stats, start.elapsed(), Some(&tracker)))
    }

    async fn run_sequential(
        &self,
        files: Vec<PathBuf>,
        target: &str,
        tracker: &ProgressTracker,
    ) -> Vec<ConversionResult> {
        let mut results = Vec::with_capacity(files.len());

        for source in files {
            let result = convert_guarded(&self.converter, source, target).await;
            tracker.handle_result(&result).await;
            results.push(result);
        }

        results
    }

    async fn run_parallel(
        &self,
        files: Vec<PathBuf>,
        target: &str,
        workers: usize,
        tracker: &ProgressTracker,
    ) -> Vec<ConversionResult> {
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(files.len());
        let total = files.len();

        for source in files {
            // The permit is taken before spawning so at most `workers` tasks exist
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Worker pool closed: {}", e);
                    break;
                }
            };

            let converter = self.converter.clone();
            let tracker = tracker.clone();
            let target = target.to_string();
            let task_source = source.clone();

            let handle = tasks.spawn(async move {
                let _permit = permit;
                let result = convert_guarded(&converter, task_source, &target).await;
                tracker.handle_result(&result).await;
                result
            });
            pending.insert(handle.id(), source);
        }

        collect_results(tasks, pending, total).await
    }

    fn log_configuration(&self, root: &Path, target: &str, files: &[PathBuf], parallel: bool, workers: usize) {
        let config = self.converter.config();
        let total_bytes: u64 = files
            .iter()
            .filter_map(|f| std::fs::metadata(f).ok())
            .map(|m| m.len())
            .sum();

        info!("Starting conversion in: {}", root.display());
        info!("Target format: {}", target);
        info!(
            "Fallback encoders: video={}, audio={}",
            config.video_encoder, config.audio_encoder
        );
        if parallel {
            info!("Mode: parallel ({} workers)", workers);
        } else {
            info!("Mode: sequential");
        }
        if let Some(ref output_dir) = config.output_dir {
            info!("Output directory: {}", output_dir.display());
        }
        info!(
            "Found {} video files ({})",
            files.len(),
            FileManager::format_size(total_bytes)
        );
    }

    fn finish(
        &self,
        results: Vec<ConversionResult>,
        stats: ConversionStats,
        elapsed: Duration,
        tracker: Option<&ProgressTracker>,
    ) -> BatchReport {
        if let Some(tracker) = tracker {
            tracker.finish(&stats.format_summary());
        }

        if self.mode == ProgressMode::Json {
            JsonMessage::complete(&stats, elapsed.as_secs_f64()).emit();
        } else {
            info!("=== Conversion Complete ===");
            info!("{}", stats.format_summary());
            info!("Average time per converted file: {:.2}s", stats.average_seconds());
        }

        BatchReport {
            results,
            stats,
            elapsed,
        }
    }
}

/// Drain `tasks`, turning a task that died before producing a result into a
/// failed result for the source it was spawned for
async fn collect_results(
    mut tasks: JoinSet<ConversionResult>,
    mut pending: HashMap<task::Id, PathBuf>,
    total: usize,
) -> Vec<ConversionResult> {
    let mut results = Vec::with_capacity(total);

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, result)) => {
                pending.remove(&id);
                results.push(result);
            }
            Err(e) => {
                error!("Conversion task did not complete: {}", e);
                if let Some(source) = pending.remove(&e.id()) {
                    results.push(ConversionResult::failed(
                        &source,
                        format!("conversion task did not complete: {}", e),
                        Duration::ZERO,
                    ));
                }
            }
        }
    }

    results
}

/// Run one conversion, turning a panic into a failed result for `source`
async fn convert_guarded(converter: &Converter, source: PathBuf, target: &str) -> ConversionResult {
    let start = Instant::now();
    let request = ConversionRequest::new(source, target);

    match AssertUnwindSafe(converter.convert(&request)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("Conversion of {} panicked: {}", request.source().display(), reason);
            ConversionResult::failed(
                request.source(),
                format!("conversion task panicked: {}", reason),
                start.elapsed(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;
    use crate::job::ConversionOutcome;
    use crate::testing::{touch, MockEngine, Step};
    use tempfile::TempDir;

    fn runner(engine: &Arc<MockEngine>) -> BatchRunner {
        let converter = Converter::new(Arc::new(ConversionConfig::default()), engine.clone());
        BatchRunner::new(Arc::new(converter), ProgressMode::Silent)
    }

    fn sources(report: &BatchReport) -> Vec<String> {
        report
            .results
            .iter()
            .map(|r| r.source().file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_parallel_respects_max_workers() {
        let dir = TempDir::new().unwrap();
        for name in ["a.mkv", "b.avi", "c.mov"] {
            touch(&dir, name);
        }
        let engine = Arc::new(MockEngine::new().with_delay(Duration::from_millis(50)));

        let report = runner(&engine).run(dir.path(), "mp4", true, 2).await.unwrap();

        assert_eq!(report.results.len(), 3);
        assert_eq!(engine.peak_concurrency(), 2);
        assert_eq!(report.stats.fast_path, 3);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        for name in ["a.mkv", "broken.mkv", "c.mkv", "d.mkv"] {
            touch(&dir, name);
        }
        let engine = Arc::new(MockEngine::new().failing_for("broken"));

        let report = runner(&engine).run(dir.path(), "mp4", true, 4).await.unwrap();

        assert_eq!(report.results.len(), 4);
        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].source().ends_with("broken.mkv"));
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.converted(), 3);
    }

    #[tokio::test]
    async fn test_sequential_keeps_discovery_order() {
        let dir = TempDir::new().unwrap();
        for name in ["c.mkv", "a.mkv", "b.mp4"] {
            touch(&dir, name);
        }
        let engine = Arc::new(MockEngine::new().with_delay(Duration::from_millis(5)));

        let report = runner(&engine).run(dir.path(), "mp4", false, 4).await.unwrap();

        assert_eq!(sources(&report), vec!["a.mkv", "b.mp4", "c.mkv"]);
        assert_eq!(report.results[1].outcome(), ConversionOutcome::Skipped);
        assert_eq!(engine.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_empty_directory_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "readme.txt");
        let engine = Arc::new(MockEngine::new());

        let report = runner(&engine).run(dir.path(), "mkv", true, 4).await.unwrap();

        assert!(report.results.is_empty());
        assert_eq!(report.stats.total, 0);
        assert!(!report.has_failures());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_file_root() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "movie.mkv");
        let engine = Arc::new(MockEngine::new().remux(Step::Fail));

        let report = runner(&engine).run(&file, "mp4", true, 4).await.unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].outcome(), ConversionOutcome::Reencoded);
        assert_eq!(engine.reencode_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(MockEngine::new());

        let err = runner(&engine)
            .run(&dir.path().join("nope"), "mp4", true, 4)
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unsupported_target_is_rejected_before_discovery() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.mkv");
        let engine = Arc::new(MockEngine::new());

        let err = runner(&engine).run(dir.path(), "gif", true, 4).await.unwrap_err();

        assert!(matches!(err, ConvertError::UnsupportedFormat(_)));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_recursive_discovery_and_zero_workers() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "top.avi");
        touch(&dir, "season1/ep1.mkv");
        touch(&dir, "season1/extras/ep1.nfo");
        let engine = Arc::new(MockEngine::new());

        let report = runner(&engine).run(dir.path(), "mp4", true, 0).await.unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(engine.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_failed_result() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "fine.mkv");
        touch(&dir, "cursed.mkv");
        let engine = Arc::new(MockEngine::new().panicking_for("cursed"));

        let report = runner(&engine).run(dir.path(), "mp4", true, 2).await.unwrap();

        assert_eq!(report.results.len(), 2);
        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].source().ends_with("cursed.mkv"));
        assert!(failed[0].error().unwrap().contains("panicked"));
    }

    #[tokio::test]
    async fn test_task_dying_outside_guard_still_yields_result() {
        let mut tasks: JoinSet<ConversionResult> = JoinSet::new();
        let mut pending = HashMap::new();

        let ok_source = PathBuf::from("/videos/fine.mkv");
        let ok_result = ConversionResult::skipped(&ok_source, Duration::ZERO);
        let handle = tasks.spawn(async move { ok_result });
        pending.insert(handle.id(), ok_source);

        let lost_source = PathBuf::from("/videos/lost.mkv");
        let handle = tasks.spawn(async { panic!("tracker exploded") });
        pending.insert(handle.id(), lost_source);

        let mut results = collect_results(tasks, pending, 2).await;
        results.sort_by(|a, b| a.source().cmp(b.source()));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].outcome(), ConversionOutcome::Skipped);
        assert!(results[1].source().ends_with("lost.mkv"));
        assert!(results[1].is_failure());
        assert!(results[1].error().unwrap().contains("did not complete"));
    }
}
