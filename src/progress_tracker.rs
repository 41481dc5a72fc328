//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso tra i task di conversione.
//! Gestisce sia output JSON che progress bar tradizionale.
//!
//! ## Responsabilità:
//! - Aggiornare le statistiche del batch sotto lock a ogni completamento
//! - Inoltrare ogni risultato al sink scelto (bar, JSON, silenzioso)

use crate::{
    job::ConversionResult,
    json_output::JsonMessage,
    progress::{ConversionStats, ProgressManager},
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Where per-file progress goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// Terminal progress bar with one status line per file
    #[default]
    Bar,
    /// JSON-lines events on stdout
    Json,
    /// Statistics only
    Silent,
}

#[derive(Clone)]
enum Reporter {
    Bar(ProgressManager),
    Json,
    Silent,
}

/// Tracker progress unificato
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    stats: Arc<Mutex<ConversionStats>>,
    reporter: Reporter,
}

impl ProgressTracker {
    /// Crea un nuovo tracker
    pub fn new(total_files: usize, mode: ProgressMode) -> Self {
        let reporter = match mode {
            ProgressMode::Bar => Reporter::Bar(ProgressManager::new(total_files as u64)),
            ProgressMode::Json => Reporter::Json,
            ProgressMode::Silent => Reporter::Silent,
        };

        Self {
            total_files,
            stats: Arc::new(Mutex::new(ConversionStats::new())),
            reporter,
        }
    }

    /// Registra il completamento di un file e notifica il sink
    pub async fn handle_result(&self, result: &ConversionResult) {
        let snapshot = {
            let mut stats = self.stats.lock().await;
            stats.record(result);
            stats.clone()
        };

        match &self.reporter {
            Reporter::Bar(bar) => {
                bar.println(&result.status_line());
                let name = result
                    .source()
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy();
                bar.update(&format!("[{}] {}", result.outcome().tag(), name));
            }
            Reporter::Json => {
                JsonMessage::file_complete(result).emit();
                JsonMessage::progress(self.total_files, &snapshot).emit();
            }
            Reporter::Silent => {}
        }
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        if let Reporter::Bar(bar) = &self.reporter {
            bar.finish(summary);
        }
    }

    /// Ottieni statistiche per report finale
    pub async fn stats(&self) -> ConversionStats {
        self.stats.lock().await.clone()
    }
}
