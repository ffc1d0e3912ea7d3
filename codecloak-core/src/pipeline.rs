//! Ordered stage lists and the per-run state the stages share

use crate::errors::{ObfuscationError, Result, StageError};
use crate::language::Language;
use crate::names::NameSupply;
use std::time::Instant;
use tracing::{debug, error, info};

/// A single `(text, ctx) -> text` transformation
pub type StageFn = fn(&str, &mut RunContext) -> std::result::Result<String, StageError>;

#[derive(Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub apply: StageFn,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Stage").field(&self.name).finish()
    }
}

/// A language's fixed stage sequence
#[derive(Debug)]
pub struct Pipeline {
    language: Language,
    stages: &'static [Stage],
}

impl Pipeline {
    pub const fn new(language: Language, stages: &'static [Stage]) -> Self {
        Self { language, stages }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name).collect()
    }

    /// Apply every stage in order, each consuming the previous output.
    ///
    /// The first failing stage aborts the run; no partial text escapes.
    pub fn run(&self, source: &str, names: NameSupply) -> Result<String> {
        let started = Instant::now();
        info!(
            language = %self.language,
            bytes = source.len(),
            "Obfuscating source"
        );

        let mut ctx = RunContext::new(names);
        let mut text = source.to_string();

        for stage in self.stages {
            text = (stage.apply)(&text, &mut ctx).map_err(|err| {
                error!(
                    language = %self.language,
                    stage = stage.name,
                    "{} obfuscation failed: {}",
                    self.language,
                    err
                );
                ObfuscationError::TransformFailure {
                    language: self.language,
                    stage: stage.name,
                    message: err.to_string(),
                }
            })?;
            debug!(stage = stage.name, bytes = text.len(), "Stage applied");
        }

        info!(
            language = %self.language,
            bytes = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Obfuscation complete"
        );
        Ok(text)
    }
}

/// State owned by one pipeline invocation
#[derive(Debug)]
pub struct RunContext {
    pub names: NameSupply,
    pub placeholders: PlaceholderTable,
    /// Lines at the top of the text that later stages must not split
    pub prologue_lines: usize,
}

impl RunContext {
    pub fn new(names: NameSupply) -> Self {
        Self {
            names,
            placeholders: PlaceholderTable::default(),
            prologue_lines: 0,
        }
    }
}

/// Spans pulled out of the text and the markers standing in for them.
///
/// Markers look like `/*<s>3<s>*/`, where `<s>` is a character that does not
/// occur anywhere in the input, so neither the source nor any generated code
/// can contain a marker by accident.
#[derive(Debug)]
pub struct PlaceholderTable {
    sentinel: char,
    spans: Vec<String>,
}

impl Default for PlaceholderTable {
    fn default() -> Self {
        Self {
            sentinel: '\u{1}',
            spans: Vec::new(),
        }
    }
}

impl PlaceholderTable {
    /// Pick a sentinel absent from `text`; must run before any `protect`
    pub fn choose_sentinel(&mut self, text: &str) -> std::result::Result<char, StageError> {
        let mut candidates = ('\u{1}'..='\u{8}')
            .chain('\u{e}'..='\u{1f}')
            .chain('\u{e000}'..='\u{f8ff}');
        let sentinel = candidates
            .find(|c| !text.contains(*c))
            .ok_or(StageError::NoSentinel)?;
        self.sentinel = sentinel;
        Ok(sentinel)
    }

    /// Store `span` and return the marker that replaces it
    pub fn protect(&mut self, span: &str) -> String {
        self.spans.push(span.to_string());
        self.marker(self.spans.len() - 1)
    }

    pub fn marker(&self, index: usize) -> String {
        format!("/*{s}{index}{s}*/", s = self.sentinel)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Put every span back in place of its marker, in list order
    pub fn restore(&self, text: &str) -> std::result::Result<String, StageError> {
        let mut restored = text.to_string();
        for (index, span) in self.spans.iter().enumerate() {
            let marker = self.marker(index);
            let Some(at) = restored.find(&marker) else {
                return Err(StageError::LostPlaceholder(index));
            };
            restored.replace_range(at..at + marker.len(), span);
        }
        Ok(restored)
    }
}
