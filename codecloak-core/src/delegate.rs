//! Hand-off to external obfuscators for the script languages.
//!
//! JavaScript and TypeScript are not transformed by the engine. A
//! [`ScriptObfuscator`] receives the source and returns the obfuscated text;
//! [`CommandDelegate`] does this by piping the source through configured
//! programs.

use crate::config::DelegateConfig;
use crate::language::Language;
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DelegateError {
    #[error("no external obfuscator configured for {0}")]
    NotConfigured(Language),

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{program}` produced output that is not UTF-8")]
    NonUtf8 { program: String },
}

pub trait ScriptObfuscator: Send + Sync {
    fn obfuscate(&self, source: &str, language: Language) -> Result<String, DelegateError>;
}

/// Runs external commands as stdin → stdout filters
#[derive(Debug, Clone, Default)]
pub struct CommandDelegate {
    javascript: Option<Vec<String>>,
    typescript: Option<Vec<String>>,
}

impl CommandDelegate {
    pub fn from_config(config: &DelegateConfig) -> Self {
        Self {
            javascript: config.javascript.clone().filter(|argv| !argv.is_empty()),
            typescript: config.typescript.clone().filter(|argv| !argv.is_empty()),
        }
    }

    /// Whether every command `language` needs is present
    pub fn handles(&self, language: Language) -> bool {
        match language {
            Language::JavaScript => self.javascript.is_some(),
            Language::TypeScript => self.javascript.is_some() && self.typescript.is_some(),
            _ => false,
        }
    }
}

impl ScriptObfuscator for CommandDelegate {
    fn obfuscate(&self, source: &str, language: Language) -> Result<String, DelegateError> {
        let javascript = self
            .javascript
            .as_deref()
            .ok_or(DelegateError::NotConfigured(language))?;

        match language {
            Language::JavaScript => run_filter(javascript, source),
            Language::TypeScript => {
                let transpiler = self
                    .typescript
                    .as_deref()
                    .ok_or(DelegateError::NotConfigured(language))?;
                let transpiled = run_filter(transpiler, source)?;
                run_filter(javascript, &transpiled)
            }
            other => Err(DelegateError::NotConfigured(other)),
        }
    }
}

/// Feed `input` to the program on stdin and collect its stdout
fn run_filter(argv: &[String], input: &str) -> Result<String, DelegateError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(DelegateError::Spawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };
    debug!(program = %program, bytes = input.len(), "Running external obfuscator");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| DelegateError::Spawn {
            program: program.clone(),
            source,
        })?;

    // write from a separate thread so a child that fills its stdout pipe
    // before draining stdin cannot deadlock us
    let writer = child.stdin.take().map(|mut stdin| {
        let input = input.to_owned();
        thread::spawn(move || stdin.write_all(input.as_bytes()))
    });

    let output = child
        .wait_with_output()
        .map_err(|source| DelegateError::Spawn {
            program: program.clone(),
            source,
        })?;

    if let Some(Ok(Err(err))) = writer.map(|handle| handle.join()) {
        warn!(program = %program, error = %err, "External obfuscator did not read all input");
    }

    if !output.status.success() {
        return Err(DelegateError::Failed {
            program: program.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| DelegateError::NonUtf8 {
        program: program.clone(),
    })
}
