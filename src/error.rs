//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `UnsupportedFormat`: Formato di destinazione o sorgente sconosciuto
//! - `EngineNotFound`: ffmpeg non trovato (fatale all'avvio)
//! - `FastPathFailed`: Remux senza ricodifica fallito (innesca il fallback)
//! - `ReencodeFailed`: Ricodifica fallita, errore terminale per il file
//! - `Timeout`: Il processo esterno ha superato il tempo massimo
//! - `InvalidInput`: Path sorgente mancante o non valido
//! - `Io`: Errori di I/O (file illeggibili, destinazione non scrivibile)
//! - `Config`: Configurazione non valida
//!
//! Gli errori per singolo file vengono registrati nel `ConversionResult`,
//! solo `EngineNotFound` e `Config` interrompono il programma.
//!
//! ## Esempio:
//! ```rust
//! use video_format_converter::ConvertError;
//!
//! let err = ConvertError::Timeout { seconds: 900 };
//! assert_eq!(err.to_string(), "Engine timed out after 900s");
//! ```

/// Custom error types for video conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Transcoding engine not found: {0}")]
    EngineNotFound(String),

    #[error("Stream copy failed: {0}")]
    FastPathFailed(String),

    #[error("Re-encode failed: {0}")]
    ReencodeFailed(String),

    #[error("Engine timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
