//! Per-run table of original names and their generated replacements

use crate::errors::StageError;
use crate::lexicon::ProtectedNames;
use crate::names::NameSupply;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

/// Original → generated name mapping, scoped to one pipeline run.
///
/// Entries keep insertion order so a seeded run always substitutes in the
/// same order. Replacements come from the run's [`NameSupply`], so they are
/// unique across every map of the run and never a protected word.
#[derive(Debug, Default, Clone)]
pub struct IdentifierMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.index
            .get(original)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Whether `name` was handed out as a replacement in this map
    pub fn is_replacement(&self, name: &str) -> bool {
        self.issued.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(original, replacement)| (original.as_str(), replacement.as_str()))
    }

    /// Replacement for `original`, generating and recording one on first sight
    pub fn assign(
        &mut self,
        original: &str,
        names: &mut NameSupply,
        protected: &ProtectedNames,
    ) -> String {
        if let Some(existing) = self.get(original) {
            return existing.to_string();
        }

        let replacement = names.identifier_except(|candidate| {
            candidate == original || protected.contains(candidate)
        });
        self.insert(original.to_string(), replacement.clone());
        replacement
    }

    /// Merge entries of `other` whose originals are not mapped here yet.
    /// Both maps must draw from the same supply for the result to stay
    /// one-to-one.
    pub fn absorb(&mut self, other: IdentifierMap) {
        for (original, replacement) in other.entries {
            if !self.index.contains_key(&original) {
                self.insert(original, replacement);
            }
        }
    }

    /// Replace every whole-word occurrence of each original name
    pub fn substitute_words(&self, text: &str) -> Result<String, StageError> {
        self.substitute(text, r"\b", "")
    }

    /// Replace `Original::` qualifiers, leaving bare occurrences alone
    pub fn substitute_qualifiers(&self, text: &str) -> Result<String, StageError> {
        self.substitute(text, "::", "::")
    }

    fn substitute(&self, text: &str, tail: &str, suffix: &str) -> Result<String, StageError> {
        if self.entries.is_empty() {
            return Ok(text.to_string());
        }

        let alternation = self
            .entries
            .iter()
            .map(|(original, _)| regex::escape(original))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\b({alternation}){tail}"))?;

        let replaced = pattern.replace_all(text, |caps: &Captures| {
            let word = &caps[1];
            format!("{}{}", self.get(word).unwrap_or(word), suffix)
        });
        Ok(replaced.into_owned())
    }

    fn insert(&mut self, original: String, replacement: String) {
        self.issued.insert(replacement.clone());
        self.index.insert(original.clone(), self.entries.len());
        self.entries.push((original, replacement));
    }
}
