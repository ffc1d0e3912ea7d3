//! Layered configuration: built-in defaults, an optional file, then
//! `CODECLOAK_*` environment variables.

use crate::names::DEFAULT_NAME_LENGTH;
use config as config_rs;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default JSON body limit for the HTTP service (50 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub delegates: DelegateConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of every generated identifier
    pub name_length: usize,
    /// Fixed seed for reproducible output; fresh entropy per run when unset
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name_length: DEFAULT_NAME_LENGTH,
            seed: None,
        }
    }
}

/// External commands for the script languages. Each is an argv array; the
/// program reads source on stdin and writes the result to stdout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateConfig {
    pub javascript: Option<Vec<String>>,
    /// TypeScript to JavaScript transpiler, run before the JavaScript command
    pub typescript: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Config(#[from] config_rs::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration, with later sources overriding earlier ones.
///
/// `path`, when given, must exist; its format follows the extension
/// (`.toml`, `.yaml`, `.json`, ...).
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = config_rs::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config_rs::File::from(path).required(true));
    }

    builder = builder.add_source(
        config_rs::Environment::with_prefix("CODECLOAK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let app: AppConfig = builder.build()?.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.name_length == 0 {
            return Err(ConfigError::Invalid(
                "engine.name_length must be at least 1".into(),
            ));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.body_limit_bytes must be positive".into(),
            ));
        }
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind_address is empty".into()));
        }
        for (key, argv) in [
            ("delegates.javascript", &self.delegates.javascript),
            ("delegates.typescript", &self.delegates.typescript),
        ] {
            if argv.as_ref().is_some_and(|argv| argv.is_empty()) {
                return Err(ConfigError::Invalid(format!("{key} has no program")));
            }
        }
        Ok(())
    }
}
