//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `ConversionConfig` con tutti i parametri di conversione
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `supported_formats`: Container riconosciuti (default: registry in `formats`)
//! - `video_encoder`: Encoder video per la ricodifica (default: "libx264")
//! - `audio_encoder`: Encoder audio per la ricodifica (default: "aac")
//! - `max_workers`: Numero di conversioni concorrenti (default: 4)
//! - `parallel`: Abilita il worker pool (default: true)
//! - `engine_path`: Path esplicito di ffmpeg (default: None = cerca nel PATH)
//! - `engine_timeout_secs`: Tempo massimo per ogni invocazione (default: 900, 0 = nessun limite)
//! - `output_dir`: Directory di output (default: None = accanto al file sorgente)
//! - `log_file`: File di log append-only (default: "video_conversion.log")
//! - `json_output`: Eventi JSON su stdout al posto della progress bar
//! - `upload_limit_bytes`: Dimensione massima di un upload web (default: 4 GiB)
//!
//! La configurazione viene costruita una sola volta all'avvio, validata e poi
//! condivisa in sola lettura tramite `Arc<ConversionConfig>`.
//!
//! ## Esempio:
//! ```rust
//! use video_format_converter::ConversionConfig;
//!
//! let config = ConversionConfig {
//!     max_workers: 8,
//!     ..Default::default()
//! };
//! config.validate().unwrap();
//! ```

use crate::error::ConvertError;
use crate::formats;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process-wide conversion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Recognized container extensions, lowercase without dot
    pub supported_formats: Vec<String>,
    /// Video encoder for the re-encode fallback
    pub video_encoder: String,
    /// Audio encoder for the re-encode fallback
    pub audio_encoder: String,
    /// Upper bound on concurrent conversions
    pub max_workers: usize,
    /// Use the worker pool for directories
    pub parallel: bool,
    /// Explicit transcoding engine binary
    pub engine_path: Option<PathBuf>,
    /// Per-invocation engine timeout in seconds (0 disables it)
    pub engine_timeout_secs: u64,
    /// Where outputs go (None = next to the source)
    pub output_dir: Option<PathBuf>,
    /// Append-only log file
    pub log_file: PathBuf,
    /// Emit JSON events instead of the progress bar
    pub json_output: bool,
    /// Maximum accepted upload size for the web front door
    pub upload_limit_bytes: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            supported_formats: formats::default_formats(),
            video_encoder: formats::DEFAULT_VIDEO_ENCODER.to_string(),
            audio_encoder: formats::DEFAULT_AUDIO_ENCODER.to_string(),
            max_workers: 4,
            parallel: true,
            engine_path: None,
            engine_timeout_secs: 900,
            output_dir: None,
            log_file: PathBuf::from("video_conversion.log"),
            json_output: false,
            upload_limit_bytes: 4 * 1024 * 1024 * 1024u64,
        }
    }
}

impl ConversionConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.supported_formats.is_empty() {
            return Err(ConvertError::Config("At least one supported format is required".into()));
        }

        if let Some(bad) = self
            .supported_formats
            .iter()
            .find(|f| f.is_empty() || **f != formats::normalize(f))
        {
            return Err(ConvertError::Config(format!(
                "Formats must be lowercase extensions without a dot, got '{}'",
                bad
            )));
        }

        if self.video_encoder.trim().is_empty() || self.audio_encoder.trim().is_empty() {
            return Err(ConvertError::Config("Video and audio encoders must not be empty".into()));
        }

        if self.max_workers == 0 {
            return Err(ConvertError::Config("Number of workers must be greater than 0".into()));
        }

        // Validate output path if specified
        if let Some(ref output_dir) = self.output_dir {
            if !output_dir.is_dir() {
                return Err(ConvertError::Config(format!(
                    "Output path is not an existing directory: {}",
                    output_dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Check whether `format` is a recognized container
    pub fn supports(&self, format: &str) -> bool {
        let format = formats::normalize(format);
        self.supported_formats.iter().any(|f| *f == format)
    }

    /// Check whether a discovered file should enter a batch
    pub fn is_source_file(&self, path: &Path) -> bool {
        formats::extension_of(path).is_some_and(|ext| self.supports(&ext))
    }

    /// First configured format, used as the web form default
    pub fn default_format(&self) -> &str {
        self.supported_formats
            .first()
            .map(String::as_str)
            .unwrap_or(formats::DEFAULT_FORMAT)
    }

    /// Engine timeout, `None` when disabled
    pub fn engine_timeout(&self) -> Option<Duration> {
        (self.engine_timeout_secs > 0).then(|| Duration::from_secs(self.engine_timeout_secs))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: ConversionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
