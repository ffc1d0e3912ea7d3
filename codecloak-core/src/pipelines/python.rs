//! Python: rename assigned names, XOR-encode string literals behind a
//! generated decoder, splice in a dead block, and guard every `if` with an
//! always-true flag.

use crate::errors::StageError;
use crate::identifier_map::IdentifierMap;
use crate::lexicon::{ProtectedNames, PYTHON_PROTECTED};
use crate::names::NameSupply;
use crate::pipeline::{RunContext, Stage};
use crate::rewrite::{line_indent, rewrite, Edit};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Key XORed into every code point of an encoded literal
pub const STRING_KEY: u32 = 0x33;

pub(crate) static STAGES: &[Stage] = &[
    Stage {
        name: "rename-assignments",
        apply: rename_assignments,
    },
    Stage {
        name: "encode-strings",
        apply: encode_strings,
    },
    Stage {
        name: "inject-dead-code",
        apply: inject_dead_code,
    },
    Stage {
        name: "guard-conditionals",
        apply: guard_conditionals,
    },
];

static ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([a-zA-Z_][a-zA-Z0-9_]*)\s*=").unwrap());

static CONDITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bif\s+(.*?):").unwrap());

/// Lines that continue the statement above them
const CONTINUATION_KEYWORDS: &[&str] = &["else", "elif", "except", "finally"];

fn rename_assignments(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let protected: &ProtectedNames = &PYTHON_PROTECTED;
    let names = &mut ctx.names;
    let mut assigned = IdentifierMap::new();

    let renamed = rewrite(text, &ASSIGNMENT, |caps| {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            return Edit::Keep;
        };
        // `x == y` compares, it does not bind
        if protected.contains(name.as_str()) || text[whole.end()..].starts_with('=') {
            return Edit::Keep;
        }
        Edit::Replace(format!("{} =", assigned.assign(name.as_str(), names, protected)))
    });

    debug!(assignments = assigned.len(), "Renamed assigned names");
    assigned.substitute_words(&renamed)
}

/// Replace every non-empty quoted literal with a call to a generated XOR
/// decoder, which is prepended to the program.
fn encode_strings(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let decoder = ctx.names.identifier();
    let param = ctx.names.identifier();
    let item = ctx.names.identifier();

    let mut out = String::with_capacity(text.len() + 128);
    let mut copied = 0;
    let mut encoded = 0;
    for (start, end) in literal_spans(text) {
        let content = &text[start + 1..end - 1];
        if content.is_empty() {
            continue;
        }
        out.push_str(&text[copied..start]);
        out.push_str(&format!("{decoder}(\"{}\")", encode_literal(content)?));
        copied = end;
        encoded += 1;
    }
    out.push_str(&text[copied..]);

    debug!(literals = encoded, "Encoded string literals");
    ctx.prologue_lines = 3;
    Ok(format!(
        "def {decoder}({param}):\n    return ''.join(chr(ord({item}) ^ {STRING_KEY:#04x}) for {item} in {param})\n\n{out}"
    ))
}

/// Byte ranges of quoted literals, quotes included.
///
/// A literal opens at `"` or `'` and closes at the next unescaped matching
/// quote on the same line. If the line ends first, the quote of the last
/// `\<quote>` pair closes it instead; with no such pair the opening quote is
/// treated as plain text.
fn literal_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let quote = bytes[i];
        if quote != b'"' && quote != b'\'' {
            i += 1;
            continue;
        }
        match closing_quote(bytes, i + 1, quote) {
            Some(close) => {
                spans.push((i, close + 1));
                i = close + 1;
            }
            None => i += 1,
        }
    }
    spans
}

fn closing_quote(bytes: &[u8], from: usize, quote: u8) -> Option<usize> {
    let mut last_escaped = None;
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b if b == quote => return Some(j),
            b'\n' | b'\r' => break,
            b'\\' if bytes.get(j + 1) == Some(&quote) => {
                last_escaped = Some(j + 1);
                j += 2;
            }
            _ => j += 1,
        }
    }
    last_escaped
}

/// XOR each code point with [`STRING_KEY`] and escape the result so it
/// reads back as the same characters inside a double-quoted literal
fn encode_literal(content: &str) -> Result<String, StageError> {
    let mut encoded = String::with_capacity(content.len());
    for c in content.chars() {
        let code = u32::from(c) ^ STRING_KEY;
        let xored = char::from_u32(code).ok_or(StageError::InvalidCodePoint(code))?;
        push_escaped(&mut encoded, xored);
    }
    Ok(encoded)
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '"' => out.push_str("\\\""),
        ' '..='~' => out.push(c),
        c if u32::from(c) < 0x100 => out.push_str(&format!("\\x{:02x}", u32::from(c))),
        c if u32::from(c) < 0x1_0000 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
        c => out.push_str(&format!("\\U{:08x}", u32::from(c))),
    }
}

/// Insert a self-contained dead block at a random top-level statement
/// boundary after the decoder prologue
fn inject_dead_code(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let block = dead_block(&mut ctx.names);
    let mut lines: Vec<&str> = text.split('\n').collect();
    let first = ctx.prologue_lines.min(lines.len());
    let candidates: Vec<usize> = (first..=lines.len())
        .filter(|&i| i == lines.len() || is_statement_boundary(&lines, i))
        .collect();
    let at = candidates[ctx.names.index(candidates.len())];

    lines.insert(at, &block);
    debug!(line = at, "Inserted dead block");
    Ok(lines.join("\n"))
}

/// Whether a new top-level statement may start right before `lines[i]`
fn is_statement_boundary(lines: &[&str], i: usize) -> bool {
    let line = lines[i];
    if line.trim().is_empty() || line.starts_with(char::is_whitespace) {
        return false;
    }
    let continues = CONTINUATION_KEYWORDS.iter().any(|kw| {
        line.strip_prefix(*kw)
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
    });
    if continues || line.starts_with(&[')', ']', '}'][..]) {
        return false;
    }
    match lines[..i].iter().rev().find(|l| !l.trim().is_empty()) {
        Some(previous) => {
            let previous = previous.trim_end();
            !previous.ends_with(&[':', ',', '\\', '(', '[', '{'][..])
                && !previous.trim_start().starts_with('@')
        }
        None => true,
    }
}

fn dead_block(names: &mut NameSupply) -> String {
    let (number, word, items) = (names.identifier(), names.identifier(), names.identifier());
    let start = names.below(1000);
    let letters = names.lowercase_word(10);
    let values = (0..5)
        .map(|_| names.below(100).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let threshold = names.below(2000);
    let suffix = names.identifier();
    let extra = names.below(100);
    format!(
        "{number} = {start}\n{word} = \"{letters}\"\n{items} = [{values}]\nif {number} > {threshold}:\n    {word} += \"{suffix}\"\nelse:\n    {items}.append({extra})"
    )
}

fn guard_conditionals(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let names = &mut ctx.names;
    Ok(rewrite(text, &CONDITION, |caps| {
        let (Some(whole), Some(condition)) = (caps.get(0), caps.get(1)) else {
            return Edit::Keep;
        };
        let flag = names.identifier();
        let indent = line_indent(text, whole.start());
        Edit::Replace(format!(
            "{flag} = True\n{indent}if {flag} and ({}):",
            condition.as_str()
        ))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(seed: u64) -> RunContext {
        RunContext::new(NameSupply::seeded(seed))
    }

    #[test]
    fn assignments_and_uses_are_renamed() {
        let out = rename_assignments("total = 1\nprint(total + 1)", &mut ctx(1)).unwrap();
        assert!(!out.contains("total"));
        assert!(out.contains("print("));
    }

    #[test]
    fn comparisons_do_not_declare() {
        let out = rename_assignments("if a == 1:\n    pass", &mut ctx(2)).unwrap();
        assert_eq!(out, "if a == 1:\n    pass");
    }

    #[test]
    fn reserved_names_survive() {
        let out = rename_assignments("self = 1\nkey = 2", &mut ctx(3)).unwrap();
        assert_eq!(out, "self = 1\nkey = 2");
    }

    #[test]
    fn secret_encodes_to_known_text() {
        assert_eq!(encode_literal("secret").unwrap(), "@VPAVG");
    }

    #[test]
    fn encoded_output_escapes_quotes_and_controls() {
        // '\x11' ^ 0x33 == '"', 'o' ^ 0x33 == '\\', '3' ^ 0x33 == '\0'
        assert_eq!(encode_literal("\u{11}").unwrap(), "\\\"");
        assert_eq!(encode_literal("o").unwrap(), "\\\\");
        assert_eq!(encode_literal("3").unwrap(), "\\x00");
        assert_eq!(encode_literal("\u{263a}").unwrap(), "\\u2609");
    }

    #[test]
    fn literal_scanner_follows_escapes() {
        assert_eq!(literal_spans(r#"a = "x\"y""#), vec![(4, 10)]);
        assert_eq!(literal_spans("a = 'q' + \"r\""), vec![(4, 7), (10, 13)]);
        assert_eq!(literal_spans("don't"), Vec::<(usize, usize)>::new());
        // unterminated after an escape: the escaped quote closes it
        assert_eq!(literal_spans("\"a\\\"b\n"), vec![(0, 4)]);
    }

    #[test]
    fn empty_literals_are_kept() {
        let out = encode_strings("x = ''\ny = \"\"", &mut ctx(4)).unwrap();
        assert!(out.ends_with("\n\nx = ''\ny = \"\""));
    }

    #[test]
    fn decoder_is_prepended() {
        let mut ctx = ctx(5);
        let out = encode_strings("y = \"secret\"", &mut ctx).unwrap();
        assert!(out.starts_with("def "));
        assert_eq!(ctx.prologue_lines, 3);
        let decoder = &out[4..out.find('(').unwrap()];
        assert!(out.ends_with(&format!("y = {decoder}(\"@VPAVG\")")));
        assert!(out.contains("^ 0x33"));
    }

    #[test]
    fn dead_block_lands_on_a_top_level_boundary() {
        let source = "def f(a,\n      b):\n    return a\n\nx = f(1, 2)";
        for seed in 0..20 {
            let out = inject_dead_code(source, &mut ctx(seed)).unwrap();
            assert!(out.contains("def f(a,\n      b):\n    return a\n"));
            assert!(out.contains("\nelse:\n    "));
        }
    }

    #[test]
    fn boundaries_skip_continuations_and_decorators() {
        let lines = [
            "@cache", "def f():", "    pass", "else:", "    pass", "x = 1", "y = (", ")",
        ];
        assert!(!is_statement_boundary(&lines, 1));
        assert!(!is_statement_boundary(&lines, 2));
        assert!(!is_statement_boundary(&lines, 3));
        assert!(is_statement_boundary(&lines, 5));
        assert!(is_statement_boundary(&lines, 6));
        assert!(!is_statement_boundary(&lines, 7));
    }

    #[test]
    fn guarded_if_keeps_indentation() {
        let source = "def f(x):\n    if x > 1:\n        pass";
        let out = guard_conditionals(source, &mut ctx(6)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[1].starts_with("    ") && lines[1].ends_with(" = True"));
        assert!(lines[2].starts_with("    if "));
        assert!(lines[2].ends_with(" and (x > 1):"));
    }

    #[test]
    fn elif_is_not_guarded() {
        let source = "elif x:\n    pass";
        assert_eq!(guard_conditionals(source, &mut ctx(7)).unwrap(), source);
    }
}
