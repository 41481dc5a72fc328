//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar e le statistiche di conversione.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Tracking statistiche di conversione (convertiti, skippati, falliti)
//! - Tempo totale e medio di elaborazione
//! - Report finale con percentuale di successo
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce la progress bar principale
//! - `ConversionStats`: Traccia statistiche cumulative
//!
//! ## Statistiche tracciate:
//! - **total**: File elaborati
//! - **fast_path** / **reencoded**: File convertiti con remux o ricodifica
//! - **skipped**: File già nel formato di destinazione
//! - **failed**: File la cui conversione è fallita
//! - **total_seconds**: Tempo speso sui file convertiti
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 3/3 (100%) [OK] movie.mkv
//! ```

use crate::job::{ConversionOutcome, ConversionResult};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Manages the terminal progress bar
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Print a line to stdout without disturbing the bar
    pub fn println(&self, line: &str) {
        self.bar.suspend(|| println!("{}", line));
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics for one batch
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ConversionStats {
    pub total: usize,
    pub fast_path: usize,
    pub reencoded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_seconds: f64,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ConversionResult>) -> Self {
        let mut stats = Self::new();
        for result in results {
            stats.record(result);
        }
        stats
    }

    pub fn record(&mut self, result: &ConversionResult) {
        self.total += 1;
        match result.outcome() {
            ConversionOutcome::Skipped => self.skipped += 1,
            ConversionOutcome::FastPath => self.fast_path += 1,
            ConversionOutcome::Reencoded => self.reencoded += 1,
            ConversionOutcome::Failed => self.failed += 1,
        }
        if result.outcome().is_converted() {
            self.total_seconds += result.elapsed().as_secs_f64();
        }
    }

    /// Files that produced a new output
    pub fn converted(&self) -> usize {
        self.fast_path + self.reencoded
    }

    /// Share of files that did not fail, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total > 0 {
            (self.total - self.failed) as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn average_seconds(&self) -> f64 {
        if self.converted() > 0 {
            self.total_seconds / self.converted() as f64
        } else {
            0.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Total: {} | Converted: {} (fast path: {}, re-encoded: {}) | Skipped: {} | Failed: {} | Success rate: {:.1}% | Time: {:.2}s",
            self.total,
            self.converted(),
            self.fast_path,
            self.reencoded,
            self.skipped,
            self.failed,
            self.success_rate(),
            self.total_seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn sample() -> Vec<ConversionResult> {
        let src = Path::new("a.mkv");
        vec![
            ConversionResult::converted(src, PathBuf::from("a.mp4"), ConversionOutcome::FastPath, Duration::from_secs(1)),
            ConversionResult::converted(src, PathBuf::from("b.mp4"), ConversionOutcome::Reencoded, Duration::from_secs(3)),
            ConversionResult::skipped(src, Duration::from_secs(5)),
            ConversionResult::failed(src, "boom", Duration::from_secs(7)),
        ]
    }

    #[test]
    fn test_stats_from_results() {
        let stats = ConversionStats::from_results(&sample());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.converted(), 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert!(stats.has_failures());
        assert_eq!(stats.success_rate(), 75.0);
        // only converted files count towards processing time
        assert_eq!(stats.total_seconds, 4.0);
        assert_eq!(stats.average_seconds(), 2.0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = ConversionStats::new();
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.average_seconds(), 0.0);
        assert!(!stats.has_failures());
    }

    #[test]
    fn test_summary_mentions_counts() {
        let summary = ConversionStats::from_results(&sample()).format_summary();
        assert!(summary.contains("Converted: 2"));
        assert!(summary.contains("Skipped: 1"));
        assert!(summary.contains("Failed: 1"));
        assert!(summary.contains("75.0%"));
    }
}
