use crate::metrics::ServiceMetrics;
use anyhow::Result;
use codecloak_core::{AppConfig, Obfuscator};
use std::time::Instant;

/// Shared by every worker through `web::Data`
pub struct AppState {
    pub obfuscator: Obfuscator,
    pub metrics: ServiceMetrics,
    pub started: Instant,
}

impl AppState {
    pub fn new(obfuscator: Obfuscator) -> Result<Self> {
        Ok(Self {
            obfuscator,
            metrics: ServiceMetrics::new()?,
            started: Instant::now(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(Obfuscator::from_config(config))
    }
}
