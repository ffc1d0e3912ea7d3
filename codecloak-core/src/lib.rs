//! CodeCloak: lexical source-code obfuscation for C, C++ and Python

pub mod config;
pub mod delegate;
pub mod errors;
pub mod identifier_map;
pub mod language;
pub mod lexicon;
pub mod logger;
pub mod names;
pub mod pipeline;
pub mod pipelines;
mod rewrite;

// Re-exports
pub use config::{load_config, AppConfig, ConfigError, DelegateConfig, EngineConfig, ServerConfig};
pub use delegate::{CommandDelegate, DelegateError, ScriptObfuscator};
pub use errors::{ObfuscationError, Result, StageError};
pub use identifier_map::IdentifierMap;
pub use language::Language;
pub use names::NameSupply;
pub use pipeline::{Pipeline, PlaceholderTable, RunContext, Stage};

use std::sync::Arc;
use tracing::{error, info};

/// Where a language's source is sent
#[derive(Debug, Clone, Copy)]
pub enum Route {
    /// Transformed by one of the built-in pipelines
    Native(&'static Pipeline),
    /// Handed to the configured [`ScriptObfuscator`]
    Script(Language),
}

impl Route {
    pub fn for_language(language: Language) -> Self {
        match pipelines::for_language(language) {
            Some(pipeline) => Route::Native(pipeline),
            None => Route::Script(language),
        }
    }

    /// Resolve a request identifier such as `"cpp"` or `"py"`
    pub fn resolve(language_id: &str) -> Result<Self> {
        Ok(Self::for_language(language_id.parse()?))
    }

    pub fn language(&self) -> Language {
        match self {
            Route::Native(pipeline) => pipeline.language(),
            Route::Script(language) => *language,
        }
    }
}

/// Entry point: routes source text to the right pipeline or delegate
#[derive(Clone, Default)]
pub struct Obfuscator {
    engine: EngineConfig,
    delegate: Option<Arc<dyn ScriptObfuscator>>,
}

impl Obfuscator {
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine,
            delegate: None,
        }
    }

    /// Engine settings from `config`, plus a [`CommandDelegate`] when any
    /// script command is configured
    pub fn from_config(config: &AppConfig) -> Self {
        let obfuscator = Self::new(config.engine.clone());
        if config.delegates.javascript.is_some() || config.delegates.typescript.is_some() {
            obfuscator.with_delegate(Arc::new(CommandDelegate::from_config(&config.delegates)))
        } else {
            obfuscator
        }
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn ScriptObfuscator>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Obfuscate `source` written in the language named by `language_id`
    pub fn obfuscate(&self, source: &str, language_id: &str) -> Result<String> {
        let language: Language = language_id.parse().map_err(|err| {
            error!(language = language_id, "Rejected obfuscation request: {}", err);
            err
        })?;
        self.obfuscate_language(source, language)
    }

    pub fn obfuscate_language(&self, source: &str, language: Language) -> Result<String> {
        self.obfuscate_with(source, language, self.name_supply())
    }

    /// Like [`Obfuscator::obfuscate_language`] with an explicit name supply,
    /// for replaying a run or testing with a fixed generator
    pub fn obfuscate_with(
        &self,
        source: &str,
        language: Language,
        names: NameSupply,
    ) -> Result<String> {
        match Route::for_language(language) {
            Route::Native(pipeline) => pipeline.run(source, names),
            Route::Script(language) => self.delegate_script(source, language),
        }
    }

    fn delegate_script(&self, source: &str, language: Language) -> Result<String> {
        let Some(delegate) = &self.delegate else {
            error!(language = %language, "No external obfuscator configured");
            return Err(ObfuscationError::DelegateUnavailable(language));
        };
        info!(language = %language, bytes = source.len(), "Delegating to external obfuscator");

        delegate.obfuscate(source, language).map_err(|err| {
            error!(language = %language, "{} obfuscation failed: {}", language, err);
            match err {
                DelegateError::NotConfigured(language) => {
                    ObfuscationError::DelegateUnavailable(language)
                }
                other => ObfuscationError::TransformFailure {
                    language,
                    stage: "delegate",
                    message: other.to_string(),
                },
            }
        })
    }

    fn name_supply(&self) -> NameSupply {
        let names = match self.engine.seed {
            Some(seed) => NameSupply::seeded(seed),
            None => NameSupply::from_entropy(),
        };
        names.with_length(self.engine.name_length)
    }
}

impl std::fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obfuscator")
            .field("engine", &self.engine)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}
