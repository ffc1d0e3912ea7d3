//! Supported source languages and their identifiers

use crate::errors::ObfuscationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the dispatcher knows how to route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Every language, in the order they are advertised to clients
    pub fn all() -> [Language; 5] {
        [
            Language::JavaScript,
            Language::TypeScript,
            Language::C,
            Language::Cpp,
            Language::Python,
        ]
    }

    /// Canonical request identifier
    pub fn id(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
        }
    }

    /// Whether the engine transforms this language itself rather than
    /// handing it to an external obfuscator.
    pub fn is_native(self) -> bool {
        matches!(self, Language::C | Language::Cpp | Language::Python)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = ObfuscationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            _ => Err(ObfuscationError::UnsupportedLanguage(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("CPP".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!(" c ".parse::<Language>().unwrap(), Language::C);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
    }

    #[test]
    fn rejects_unknown_identifiers() {
        let err = "go".parse::<Language>().unwrap_err();
        assert!(matches!(err, ObfuscationError::UnsupportedLanguage(ref id) if id == "go"));
    }

    #[test]
    fn ids_round_trip() {
        for language in Language::all() {
            assert_eq!(language.id().parse::<Language>().unwrap(), language);
        }
    }
}
