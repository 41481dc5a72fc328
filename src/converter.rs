//! # Video Conversion Module
//!
//! Questo modulo converte un singolo file video nel container richiesto.
//!
//! ## Responsabilità:
//! - Validazione del formato di destinazione e del file sorgente
//! - Skip dei file già nel formato di destinazione (nessun processo avviato)
//! - Generazione di un nome di output che non sovrascrive mai file esistenti
//! - Politica a due livelli: remux veloce, poi ricodifica come fallback
//! - Logging dell'esito e del tempo impiegato per ogni file
//!
//! ## Pipeline di conversione:
//! 1. Formato non supportato o sorgente mancante → `Failed`
//! 2. Estensione sorgente == formato di destinazione → `Skipped`
//! 3. Riserva `<stem>_<YYYYmmdd_HHMMSS>.<formato>` (con `_<n>` in caso di collisione)
//! 4. Remux con stream copy: successo e output non vuoto → `FastPath`
//! 5. Scarta l'output parziale e ricodifica una sola volta → `Reencoded` o `Failed`
//!
//! ## Nomi di output:
//! Il nome viene riservato creando il file in modalità create-new, quindi due
//! conversioni concorrenti non possono mai scegliere lo stesso path.
//!
//! ## Esempio:
//! ```rust,ignore
//! let converter = Converter::new(config, engine);
//! let result = converter.convert(&ConversionRequest::new("movie.mkv", "mp4")).await;
//! ```

use crate::config::ConversionConfig;
use crate::engine::{EngineCommand, TranscodeEngine};
use crate::error::ConvertError;
use crate::formats;
use crate::job::{ConversionOutcome, ConversionRequest, ConversionResult};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::{self, OpenOptions};
use tracing::{debug, error, info, warn};

/// Upper bound on `_<n>` suffixes tried for one timestamp
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Converts one file at a time; cheap to share behind an `Arc`
pub struct Converter {
    config: Arc<ConversionConfig>,
    engine: Arc<dyn TranscodeEngine>,
}

impl Converter {
    pub fn new(config: Arc<ConversionConfig>, engine: Arc<dyn TranscodeEngine>) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert a single file. Every failure ends up in the returned result.
    pub async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        let start = Instant::now();

        let result = match self.try_convert(request, start).await {
            Ok(result) => result,
            Err(e) => ConversionResult::failed(request.source(), e, start.elapsed()),
        };

        log_result(&result);
        result
    }

    async fn try_convert(
        &self,
        request: &ConversionRequest,
        start: Instant,
    ) -> Result<ConversionResult, ConvertError> {
        let source = request.source();
        let target = request.target_format();

        if !self.config.supports(target) {
            return Err(ConvertError::UnsupportedFormat(format!(
                "{} (supported: {})",
                target,
                self.config.supported_formats.join(", ")
            )));
        }

        let is_file = fs::metadata(source).await.map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            return Err(ConvertError::InvalidInput(format!(
                "File does not exist: {}",
                source.display()
            )));
        }

        if !self.config.is_source_file(source) {
            return Err(ConvertError::UnsupportedFormat(format!(
                "{} is not a recognized video file",
                source.display()
            )));
        }

        if formats::is_same_format(source, target) {
            info!("Skipping {}: already in {} format", source.display(), target);
            return Ok(ConversionResult::skipped(source, start.elapsed()));
        }

        let output = self.reserve_output_path(source, target).await?;
        info!("Converting {} -> {}", source.display(), output.display());

        match self.fast_path(source, &output).await {
            Ok(()) => {
                return Ok(ConversionResult::converted(
                    source,
                    output,
                    ConversionOutcome::FastPath,
                    start.elapsed(),
                ))
            }
            Err(e @ ConvertError::EngineNotFound(_)) => {
                discard_output(&output).await;
                return Err(e);
            }
            Err(e) => warn!("{} ({}), re-encoding", e, source.display()),
        }

        // Drop whatever the stream copy left behind, keeping the name reserved
        fs::File::create(&output).await?;

        match self.reencode(request, &output).await {
            Ok(()) => Ok(ConversionResult::converted(
                source,
                output,
                ConversionOutcome::Reencoded,
                start.elapsed(),
            )),
            Err(e) => {
                discard_output(&output).await;
                Err(e)
            }
        }
    }

    async fn fast_path(&self, source: &Path, output: &Path) -> Result<(), ConvertError> {
        let command = EngineCommand::remux(source, output);
        debug!("Trying stream copy with {}", self.engine.name());

        let result = match self.engine.run(&command).await {
            Ok(result) => result,
            Err(e @ ConvertError::EngineNotFound(_)) => return Err(e),
            Err(e) => return Err(ConvertError::FastPathFailed(e.to_string())),
        };

        if !result.success {
            return Err(ConvertError::FastPathFailed(engine_message(&result.stderr)));
        }
        if !has_content(output).await {
            return Err(ConvertError::FastPathFailed("engine produced an empty output".into()));
        }

        debug!("Stream copy finished in {:.2}s", result.elapsed.as_secs_f64());
        Ok(())
    }

    async fn reencode(&self, request: &ConversionRequest, output: &Path) -> Result<(), ConvertError> {
        let encoders = request.encoders();
        let video = encoders.video.as_deref().unwrap_or(&self.config.video_encoder);
        let audio = encoders.audio.as_deref().unwrap_or(&self.config.audio_encoder);

        debug!(
            "Re-encoding {} (video: {}, audio: {})",
            request.source().display(),
            video,
            audio
        );

        let command = EngineCommand::reencode(request.source(), output, video, audio);
        let result = self.engine.run(&command).await?;

        if !result.success {
            return Err(ConvertError::ReencodeFailed(engine_message(&result.stderr)));
        }
        if !has_content(output).await {
            return Err(ConvertError::ReencodeFailed("engine produced an empty output".into()));
        }

        debug!("Re-encode finished in {:.2}s", result.elapsed.as_secs_f64());
        Ok(())
    }

    /// Directory an output for `source` is written to
    fn output_dir_for(&self, source: &Path) -> PathBuf {
        match self.config.output_dir {
            Some(ref dir) => dir.clone(),
            None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
        }
    }

    /// Pick and atomically create a fresh output file
    async fn reserve_output_path(&self, source: &Path, format: &str) -> Result<PathBuf, ConvertError> {
        let stem = source
            .file_stem()
            .ok_or_else(|| ConvertError::InvalidInput(format!("Invalid file name: {}", source.display())))?
            .to_string_lossy();
        let dir = self.output_dir_for(source);
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = dir.join(output_file_name(&stem, &timestamp, attempt, format));
            match OpenOptions::new().write(true).create_new(true).open(&candidate).await {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ConvertError::InvalidInput(format!(
            "No free output name for {} in {}",
            source.display(),
            dir.display()
        )))
    }
}

/// `<stem>_<timestamp>.<format>`, with `_<attempt>` once the plain name is taken
fn output_file_name(stem: &str, timestamp: &str, attempt: u32, format: &str) -> String {
    if attempt == 0 {
        format!("{}_{}.{}", stem, timestamp, format)
    } else {
        format!("{}_{}_{}.{}", stem, timestamp, attempt, format)
    }
}

fn engine_message(stderr: &str) -> String {
    if stderr.is_empty() {
        "engine exited with a non-zero status".to_string()
    } else {
        stderr.to_string()
    }
}

async fn has_content(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.len() > 0).unwrap_or(false)
}

async fn discard_output(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
}

fn log_result(result: &ConversionResult) {
    let elapsed_ms = result.elapsed().as_millis() as u64;
    match result.outcome() {
        ConversionOutcome::Failed => error!(
            source = %result.source().display(),
            outcome = %result.outcome(),
            elapsed_ms,
            "Conversion failed: {}",
            result.error().unwrap_or_default()
        ),
        outcome => info!(
            source = %result.source().display(),
            output = %result.output().map(|p| p.display().to_string()).unwrap_or_default(),
            %outcome,
            elapsed_ms,
            "Conversion finished"
        ),
    }
}
