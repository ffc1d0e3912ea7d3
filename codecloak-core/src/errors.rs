//! Error types for CodeCloak

use crate::language::Language;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ObfuscationError>;

#[derive(Error, Debug)]
pub enum ObfuscationError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("{language} obfuscation failed in stage `{stage}`: {message}")]
    TransformFailure {
        language: Language,
        stage: &'static str,
        message: String,
    },

    #[error("no external obfuscator configured for {0}")]
    DelegateUnavailable(Language),
}

impl ObfuscationError {
    /// Language the failure is tagged with, if it got past dispatch.
    pub fn language(&self) -> Option<Language> {
        match self {
            ObfuscationError::UnsupportedLanguage(_) => None,
            ObfuscationError::TransformFailure { language, .. } => Some(*language),
            ObfuscationError::DelegateUnavailable(language) => Some(*language),
        }
    }
}

/// Failure raised inside a single pipeline stage. The pipeline wraps it into
/// [`ObfuscationError::TransformFailure`] together with the stage name.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("regex compile error: {0}")]
    RegexCompile(#[from] regex::Error),

    #[error("macro placeholder {0} was lost before restoration")]
    LostPlaceholder(usize),

    #[error("no sentinel character is free in the input")]
    NoSentinel,

    #[error("code point {0:#x} cannot be encoded")]
    InvalidCodePoint(u32),
}
