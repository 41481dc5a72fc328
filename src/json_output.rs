//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico
//! (una riga JSON per evento su stdout, al posto della progress bar).
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch
//! - `file_complete`: Fine elaborazione di un file
//! - `progress`: Progresso corrente
//! - `complete`: Fine del batch con statistiche finali
//! - `error`: Errore che impedisce di proseguire

use crate::config::ConversionConfig;
use crate::job::ConversionResult;
use crate::progress::ConversionStats;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del batch
    Start {
        root: PathBuf,
        target_format: String,
        total_files: usize,
        config: JsonConfig,
    },

    /// Fine elaborazione di un file
    FileComplete {
        #[serde(flatten)]
        result: ConversionResult,
    },

    /// Progresso corrente
    Progress {
        current: usize,
        total: usize,
        percentage: f64,
        converted: usize,
        skipped: usize,
        failed: usize,
    },

    /// Batch completato
    Complete {
        #[serde(flatten)]
        stats: ConversionStats,
        success_rate: f64,
        duration_seconds: f64,
    },

    /// Errore generale
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione riportata nel messaggio `start`
#[derive(Debug, Serialize)]
pub struct JsonConfig {
    pub video_encoder: String,
    pub audio_encoder: String,
    pub max_workers: usize,
    pub parallel: bool,
    pub engine_timeout_secs: u64,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(root: PathBuf, target_format: &str, total_files: usize, config: &ConversionConfig, parallel: bool) -> Self {
        Self::Start {
            root,
            target_format: target_format.to_string(),
            total_files,
            config: JsonConfig {
                parallel,
                ..JsonConfig::from(config)
            },
        }
    }

    pub fn file_complete(result: &ConversionResult) -> Self {
        Self::FileComplete {
            result: result.clone(),
        }
    }

    pub fn progress(total: usize, stats: &ConversionStats) -> Self {
        let percentage = if total > 0 {
            (stats.total as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self::Progress {
            current: stats.total,
            total,
            percentage,
            converted: stats.converted(),
            skipped: stats.skipped,
            failed: stats.failed,
        }
    }

    pub fn complete(stats: &ConversionStats, duration_seconds: f64) -> Self {
        Self::Complete {
            stats: stats.clone(),
            success_rate: stats.success_rate(),
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

impl From<&ConversionConfig> for JsonConfig {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            video_encoder: config.video_encoder.clone(),
            audio_encoder: config.audio_encoder.clone(),
            max_workers: config.max_workers,
            parallel: config.parallel,
            engine_timeout_secs: config.engine_timeout_secs,
        }
    }
}
