//! Match-and-rewrite scanning shared by the pipelines.
//!
//! `Regex::replace_all` cannot decline a match and keep looking inside it,
//! which the declaration scanners need (e.g. `unsigned int x` first matches
//! with `int` in the name slot). [`rewrite`] drives the regex by hand so an
//! edit can ask for the scan to resume at an arbitrary later offset.

use regex::{Captures, Regex};

pub(crate) enum Edit {
    /// Substitute the whole match
    Replace(String),
    /// Leave the match as it is and continue after it
    Keep,
    /// Leave the match as it is and rescan from this byte offset
    RetryAt(usize),
}

pub(crate) fn rewrite<F>(text: &str, pattern: &Regex, mut edit: F) -> String
where
    F: FnMut(&Captures<'_>) -> Edit,
{
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while pos <= text.len() {
        let Some(caps) = pattern.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };

        pos = match edit(&caps) {
            Edit::Replace(replacement) => {
                out.push_str(&text[copied..whole.start()]);
                out.push_str(&replacement);
                copied = whole.end();
                if whole.is_empty() {
                    next_char(text, whole.end())
                } else {
                    whole.end()
                }
            }
            Edit::Keep if !whole.is_empty() => whole.end(),
            Edit::Keep => next_char(text, whole.end()),
            Edit::RetryAt(offset) => offset.max(next_char(text, whole.start())),
        };
    }

    out.push_str(&text[copied..]);
    out
}

/// Offset just past the character starting at `at`, or past the end
fn next_char(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| at + c.len_utf8())
}

/// Leading whitespace of the line containing byte offset `at`
pub(crate) fn line_indent(text: &str, at: usize) -> &str {
    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let line = &text[line_start..];
    let width = line.len() - line.trim_start_matches(|c: char| c == ' ' || c == '\t').len();
    &line[..width]
}

/// First non-whitespace character at or after `at`
pub(crate) fn next_non_space(text: &str, at: usize) -> Option<char> {
    text[at..].chars().find(|c| !c.is_whitespace())
}

/// Build an alternation of keywords where embedded spaces accept any run of
/// whitespace (`long long` also matches `long\tlong`).
pub(crate) fn keyword_alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|word| {
            word.split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|")
}
