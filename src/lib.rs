//! # Video Format Converter Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per i due binari (`convert`, `convert-serve`)
//!
//! ## Architettura dei moduli:
//! - `formats`: Registro dei container supportati e MIME type
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `engine`: Invocazione di ffmpeg (remux o ricodifica) con timeout
//! - `tool_resolver`: Ricerca del binario ffmpeg
//! - `job`: Richiesta e risultato di una singola conversione
//! - `converter`: Politica skip / fast path / ricodifica per un file
//! - `file_manager`: Discovery dei video
//! - `batch`: Orchestratore con pool di worker limitato
//! - `progress` / `progress_tracker` / `json_output`: Feedback e statistiche
//! - `interactive`: Modalità interattiva della CLI
//! - `logging`: Setup di `tracing`
//! - `web`: Front door HTTP
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use video_format_converter::{BatchRunner, ConversionConfig, Converter, FfmpegEngine, ProgressMode};
//!
//! let config = Arc::new(ConversionConfig::default());
//! let engine = Arc::new(FfmpegEngine::new("ffmpeg", config.engine_timeout()));
//! let converter = Arc::new(Converter::new(config, engine));
//! let report = BatchRunner::new(converter, ProgressMode::Bar)
//!     .run(&path, "mp4", true, 4)
//!     .await?;
//! ```

pub mod batch;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod file_manager;
pub mod formats;
pub mod interactive;
pub mod job;
pub mod json_output;
pub mod logging;
pub mod progress;
pub mod progress_tracker;
pub mod tool_resolver;
pub mod utils;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchReport, BatchRunner};
pub use config::ConversionConfig;
pub use converter::Converter;
pub use engine::{EngineCommand, EngineOutput, FfmpegEngine, TranscodeEngine};
pub use error::ConvertError;
pub use job::{ConversionOutcome, ConversionRequest, ConversionResult, EncoderOverrides};
pub use progress::ConversionStats;
pub use progress_tracker::ProgressMode;
pub use tool_resolver::ToolPathResolver;
