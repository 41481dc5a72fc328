//! # Video Format Converter - Web Server
//!
//! Punto di ingresso del binario `convert-serve`.
//!
//! ## Responsabilità:
//! - Parsing di host, porta, livello di log e file di configurazione
//! - Verifica che ffmpeg sia disponibile prima di accettare richieste
//! - Avvio del server axum con graceful shutdown (Ctrl+C o SIGTERM)
//!
//! ## Esempio di utilizzo:
//! ```bash
//! convert-serve --host 0.0.0.0 --port 8000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use video_format_converter::{
    logging::{init_logging, LogLevel},
    web::{create_router, AppState},
    ConversionConfig, FfmpegEngine, ToolPathResolver,
};

#[derive(Parser)]
#[command(name = "convert-serve")]
#[command(about = "Web front end for the video format converter")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Log level
    #[arg(long, value_enum, ignore_case = true, default_value = "info")]
    log_level: LogLevel,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => ConversionConfig::from_file(path).await?,
        None => ConversionConfig::default(),
    };
    let _guard = init_logging(args.log_level, &config.log_file)?;
    config.validate()?;

    let engine_path = ToolPathResolver::new(config.engine_path.clone()).resolve_engine()?;
    info!("Using ffmpeg at {}", engine_path.display());

    let engine = Arc::new(FfmpegEngine::new(engine_path, config.engine_timeout()));
    let state = Arc::new(AppState::new(config, engine));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", args.host, args.port))?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("Starting server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
