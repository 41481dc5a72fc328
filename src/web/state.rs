use crate::config::ConversionConfig;
use crate::converter::Converter;
use crate::engine::TranscodeEngine;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared application state
pub struct AppState {
    converter: Converter,
    conversion_slots: Arc<Semaphore>,
}

impl AppState {
    /// Outputs always land next to the upload, so any configured output
    /// directory is ignored here.
    pub fn new(config: ConversionConfig, engine: Arc<dyn TranscodeEngine>) -> Self {
        let slots = config.max_workers.max(1);
        let config = ConversionConfig {
            output_dir: None,
            ..config
        };

        Self {
            converter: Converter::new(Arc::new(config), engine),
            conversion_slots: Arc::new(Semaphore::new(slots)),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        self.converter.config()
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Bounds how many uploads are converted at once
    pub fn conversion_slots(&self) -> Arc<Semaphore> {
        self.conversion_slots.clone()
    }
}
