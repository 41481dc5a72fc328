//! # Video Format Converter - Main Entry Point
//!
//! Questo è il punto di ingresso della CLI `convert`.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Caricamento della configurazione (file JSON + override da CLI)
//! - Inizializzazione del sistema di logging con `tracing`
//! - Modalità interattiva quando il path non viene passato
//! - Avvio del batch e report finale con exit code
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Costruisce e valida la configurazione
//! 3. Configura il logging (stderr + file di log)
//! 4. Verifica che ffmpeg sia disponibile (errore fatale altrimenti)
//! 5. Chiede formato/path in modalità interattiva se necessario
//! 6. Esegue il batch; Ctrl-C lo interrompe uccidendo i processi in corso
//!
//! ## Exit code:
//! - `0`: nessun file fallito (anche batch vuoti)
//! - `1`: almeno un file fallito, path non valido o errore fatale
//! - `130`: interrotto con Ctrl-C
//!
//! ## Esempio di utilizzo:
//! ```bash
//! convert /path/to/videos --format mkv --max-workers 8
//! ```

use anyhow::{Context, Result};
use clap::{builder::PossibleValuesParser, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use video_format_converter::{
    formats,
    interactive::{self, InteractiveChoice},
    json_output::JsonMessage,
    logging::{init_logging, LogLevel},
    BatchReport, BatchRunner, ConversionConfig, Converter, FfmpegEngine, ProgressMode,
    ToolPathResolver,
};

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "convert")]
#[command(about = "Convert video files to another container format with ffmpeg")]
struct Args {
    /// Video file or directory to convert (interactive mode when omitted)
    path: Option<PathBuf>,

    /// Target container format
    #[arg(
        short,
        long,
        default_value = formats::DEFAULT_FORMAT,
        ignore_case = true,
        value_parser = PossibleValuesParser::new(formats::SUPPORTED_FORMATS.iter().copied())
    )]
    format: String,

    /// Convert directory contents in parallel (default)
    #[arg(long, overrides_with = "no_parallel")]
    parallel: bool,

    /// Convert directory contents one at a time, in order
    #[arg(long = "no-parallel", overrides_with = "parallel")]
    no_parallel: bool,

    /// Maximum number of concurrent conversions
    #[arg(long)]
    max_workers: Option<usize>,

    /// Log level
    #[arg(long, value_enum, ignore_case = true, default_value = "info")]
    log_level: LogLevel,

    /// Video encoder used when re-encoding
    #[arg(long)]
    video_encoder: Option<String>,

    /// Audio encoder used when re-encoding
    #[arg(long)]
    audio_encoder: Option<String>,

    /// Write outputs here instead of next to each source
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Per-invocation ffmpeg timeout in seconds (0 disables it)
    #[arg(long)]
    timeout: Option<u64>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit JSON-lines events on stdout instead of the progress bar
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Layer the command line over the loaded configuration
    fn apply_to(&self, config: &mut ConversionConfig) {
        if let Some(workers) = self.max_workers {
            config.max_workers = workers.max(1);
        }
        if self.no_parallel {
            config.parallel = false;
        } else if self.parallel {
            config.parallel = true;
        }
        if let Some(ref encoder) = self.video_encoder {
            config.video_encoder = encoder.clone();
        }
        if let Some(ref encoder) = self.audio_encoder {
            config.audio_encoder = encoder.clone();
        }
        if let Some(ref dir) = self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(secs) = self.timeout {
            config.engine_timeout_secs = secs;
        }
        if self.json {
            config.json_output = true;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = match args.config {
        Some(ref path) => ConversionConfig::from_file(path).await?,
        None => ConversionConfig::default(),
    };
    args.apply_to(&mut config);

    let _guard = init_logging(args.log_level, &config.log_file)?;

    if let Err(e) = config.validate() {
        return Ok(fail(&config, "Invalid configuration", &e));
    }

    let engine_path = match ToolPathResolver::new(config.engine_path.clone()).resolve_engine() {
        Ok(path) => path,
        Err(e) => return Ok(fail(&config, "ffmpeg is not available", &e)),
    };
    let engine = Arc::new(FfmpegEngine::new(engine_path, config.engine_timeout()));
    info!("Using ffmpeg at {}", engine.program().display());

    let choice = match args.path {
        Some(path) => InteractiveChoice {
            target_format: formats::normalize(&args.format),
            path,
            parallel: config.parallel,
        },
        None => {
            let prompt_config = config.clone();
            tokio::task::spawn_blocking(move || {
                interactive::prompt(&prompt_config, &mut std::io::stdin().lock(), &mut std::io::stdout())
            })
            .await
            .context("Interactive prompt failed")??
        }
    };

    let mode = if config.json_output {
        ProgressMode::Json
    } else {
        ProgressMode::Bar
    };
    let max_workers = config.max_workers;
    let converter = Arc::new(Converter::new(Arc::new(config.clone()), engine));
    let runner = BatchRunner::new(converter, mode);

    let outcome = tokio::select! {
        outcome = runner.run(&choice.path, &choice.target_format, choice.parallel, max_workers) => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping running conversions");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };

    match outcome {
        Ok(report) => {
            if !config.json_output {
                print_report(&report);
            }
            if report.has_failures() {
                Ok(ExitCode::from(EXIT_FAILURE))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Err(e) => Ok(fail(&config, "Conversion could not start", &e)),
    }
}

/// Report a fatal error on the channel the user is watching
fn fail(config: &ConversionConfig, message: &str, err: &dyn std::fmt::Display) -> ExitCode {
    error!("{}: {}", message, err);
    if config.json_output {
        JsonMessage::error(message.to_string(), Some(err.to_string())).emit();
    } else {
        eprintln!("{}: {}", message, err);
    }
    ExitCode::from(EXIT_FAILURE)
}

fn print_report(report: &BatchReport) {
    let stats = &report.stats;

    println!();
    println!("=== Conversion complete ===");
    println!("Total files: {}", stats.total);
    println!(
        "Succeeded: {} (fast path: {}, re-encoded: {})",
        stats.converted(),
        stats.fast_path,
        stats.reencoded
    );
    println!("Skipped: {}", stats.skipped);
    println!("Failed: {}", stats.failed);
    println!("Success rate: {:.1}%", stats.success_rate());
    println!("Total processing time: {:.2}s", stats.total_seconds);
    println!("Average per converted file: {:.2}s", stats.average_seconds());
    println!("Wall time: {:.2}s", report.elapsed.as_secs_f64());

    if stats.has_failures() {
        println!();
        println!("Failed files:");
        for result in report.failures() {
            println!(
                "  - {}: {}",
                result.source().display(),
                result.error().unwrap_or("unknown error")
            );
        }
    }
}
