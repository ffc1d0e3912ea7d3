//! Native obfuscation pipelines and the scanners they share

pub mod c;
pub mod cpp;
pub mod python;

use crate::errors::StageError;
use crate::identifier_map::IdentifierMap;
use crate::language::Language;
use crate::lexicon::ProtectedNames;
use crate::names::NameSupply;
use crate::pipeline::Pipeline;
use crate::rewrite::{keyword_alternation, line_indent, next_non_space, rewrite, Edit};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub static C_PIPELINE: Pipeline = Pipeline::new(Language::C, c::STAGES);
pub static CPP_PIPELINE: Pipeline = Pipeline::new(Language::Cpp, cpp::STAGES);
pub static PYTHON_PIPELINE: Pipeline = Pipeline::new(Language::Python, python::STAGES);

/// The native pipeline for `language`, if the engine handles it itself
pub fn for_language(language: Language) -> Option<&'static Pipeline> {
    match language {
        Language::C => Some(&C_PIPELINE),
        Language::Cpp => Some(&CPP_PIPELINE),
        Language::Python => Some(&PYTHON_PIPELINE),
        Language::JavaScript | Language::TypeScript => None,
    }
}

static BRACED_CONDITIONAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bif\s*\((.*?)\)\s*\{").unwrap());

/// `<type> <name>` with the type drawn from `types`
pub(crate) fn declaration_pattern(types: &[&str]) -> Regex {
    Regex::new(&format!(
        r"\b({})\s+([a-zA-Z_][a-zA-Z0-9_]*)\b",
        keyword_alternation(types)
    ))
    .unwrap()
}

/// Rename every name declared as `<type> <name>`, then every other
/// whole-word use of it.
///
/// A protected word in the name slot is not a declaration; the scan resumes
/// at that word so `unsigned int x` still reaches `int x`. With
/// `skip_calls`, a name directly followed by `(` is left for the signature
/// scanners.
pub(crate) fn rename_typed_declarations(
    text: &str,
    pattern: &Regex,
    protected: &ProtectedNames,
    skip_calls: bool,
    names: &mut NameSupply,
) -> Result<String, StageError> {
    let mut declared = IdentifierMap::new();

    let renamed = rewrite(text, pattern, |caps| {
        let (Some(kind), Some(name)) = (caps.get(1), caps.get(2)) else {
            return Edit::Keep;
        };
        if protected.contains(name.as_str())
            || (skip_calls && next_non_space(text, name.end()) == Some('('))
        {
            return Edit::RetryAt(name.start());
        }
        let replacement = declared.assign(name.as_str(), names, protected);
        Edit::Replace(format!("{} {}", kind.as_str(), replacement))
    });

    debug!(declarations = declared.len(), "Renamed typed declarations");
    declared.substitute_words(&renamed)
}

/// Where the always-true flag test goes relative to the original condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlagPlacement {
    After,
    Before,
}

/// Rewrite each `if (<cond>) {` into a random `int` flag declaration followed
/// by the condition conjoined with `(flag || !flag)`.
///
/// `else if` cannot take a declaration in front of it, so it reuses the flag
/// declared for the `if` that opened its chain at the same brace depth. When
/// that head was not braced there is no such flag and the `else if` is kept.
pub(crate) fn disguise_braced_conditionals(
    text: &str,
    placement: FlagPlacement,
    names: &mut NameSupply,
) -> String {
    let mut chain_flags: Vec<Option<String>> = Vec::new();
    let (mut scanned, mut depth) = (0usize, 0usize);

    rewrite(text, &BRACED_CONDITIONAL, |caps| {
        let (Some(whole), Some(condition)) = (caps.get(0), caps.get(1)) else {
            return Edit::Keep;
        };
        for byte in text[scanned..whole.start()].bytes() {
            match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.saturating_sub(1);
                    chain_flags.truncate(depth + 1);
                }
                _ => {}
            }
        }
        scanned = whole.start();
        let condition = condition.as_str();

        if follows_else(text, whole.start()) {
            return match chain_flags.get(depth).cloned().flatten() {
                Some(flag) => {
                    Edit::Replace(format!("if ({}) {{", tautology(placement, condition, &flag)))
                }
                None => Edit::Keep,
            };
        }

        let flag = names.identifier();
        let initial = u8::from(names.flip());
        let indent = line_indent(text, whole.start());
        let test = tautology(placement, condition, &flag);
        chain_flags.resize(depth + 1, None);
        chain_flags[depth] = Some(flag.clone());
        Edit::Replace(format!("int {flag} = {initial};\n{indent}if ({test}) {{"))
    })
}

fn tautology(placement: FlagPlacement, condition: &str, flag: &str) -> String {
    match placement {
        FlagPlacement::After => format!("({condition}) && ({flag} || !{flag})"),
        FlagPlacement::Before => format!("({flag} || !{flag}) && ({condition})"),
    }
}

/// Whether the keyword `else` ends the text before `at`
fn follows_else(text: &str, at: usize) -> bool {
    text[..at]
        .trim_end()
        .strip_suffix("else")
        .is_some_and(|rest| !rest.ends_with(|c: char| c.is_alphanumeric() || c == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{CPP_PROTECTED, CPP_TYPES, C_PROTECTED, C_TYPES};

    #[test]
    fn routes_only_native_languages() {
        assert!(for_language(Language::C).is_some());
        assert!(for_language(Language::Cpp).is_some());
        assert!(for_language(Language::Python).is_some());
        assert!(for_language(Language::JavaScript).is_none());
        assert!(for_language(Language::TypeScript).is_none());
    }

    #[test]
    fn declarations_and_uses_share_one_name() {
        let pattern = declaration_pattern(C_TYPES);
        let mut names = NameSupply::seeded(1);
        let out = rename_typed_declarations(
            "int total = 0; total += 2; return total;",
            &pattern,
            &C_PROTECTED,
            false,
            &mut names,
        )
        .unwrap();
        assert!(!out.contains("total"));
        let new_name = out
            .strip_prefix("int ")
            .and_then(|rest| rest.split(' ').next())
            .unwrap();
        assert_eq!(out.matches(new_name).count(), 3);
    }

    #[test]
    fn keyword_in_name_slot_does_not_hide_the_declarator() {
        let pattern = declaration_pattern(C_TYPES);
        let mut names = NameSupply::seeded(2);
        let out = rename_typed_declarations(
            "unsigned int flags = 1;",
            &pattern,
            &C_PROTECTED,
            false,
            &mut names,
        )
        .unwrap();
        assert!(out.starts_with("unsigned int "));
        assert!(!out.contains("flags"));
    }

    #[test]
    fn call_shaped_declarations_are_skipped_when_asked() {
        let pattern = declaration_pattern(CPP_TYPES);
        let mut names = NameSupply::seeded(3);
        let out = rename_typed_declarations(
            "int compute (int seed) { return seed; }",
            &pattern,
            &CPP_PROTECTED,
            true,
            &mut names,
        )
        .unwrap();
        assert!(out.starts_with("int compute ("));
        assert!(!out.contains("seed"));
    }

    #[test]
    fn flag_placement() {
        let mut names = NameSupply::seeded(4);
        let after = disguise_braced_conditionals("if (a) {", FlagPlacement::After, &mut names);
        assert!(after.contains("if ((a) && ("));
        let before = disguise_braced_conditionals("if (a) {", FlagPlacement::Before, &mut names);
        assert!(before.contains(") && (a)) {"));
        assert!(before.starts_with("int "));
    }

    #[test]
    fn else_if_reuses_the_chain_flag() {
        let mut names = NameSupply::seeded(6);
        let out = disguise_braced_conditionals(
            "void f(int a) {\n    if (a > 1) {\n        a = 0;\n    } else if (a < 0) {\n        a = 1;\n    }\n}",
            FlagPlacement::After,
            &mut names,
        );
        let flags = Regex::new(r"\bint \w+ = [01];").unwrap();
        assert_eq!(flags.find_iter(&out).count(), 1, "{out}");
        assert!(!out.contains("else int"));

        let head = Regex::new(
            r"int (\w+) = [01];\n    if \(\(a > 1\) && \((\w+) \|\| !(\w+)\)\) \{",
        )
        .unwrap()
        .captures(&out)
        .map(|caps| caps[1].to_string())
        .expect("flagged head");
        assert!(out.contains(&format!(
            "}} else if ((a < 0) && ({head} || !{head})) {{"
        )));
    }

    #[test]
    fn else_if_without_a_braced_head_is_kept() {
        let mut names = NameSupply::seeded(6);
        let source = "{\n    if (a) b();\n    else if (c) {\n        d();\n    }\n}";
        let out = disguise_braced_conditionals(source, FlagPlacement::Before, &mut names);
        assert_eq!(out, source);
    }

    #[test]
    fn closed_blocks_drop_their_chain_flags() {
        let mut names = NameSupply::seeded(2);
        let source = "{\n    if (a) {\n    }\n}\n{\n    if (b) x();\n    else if (c) {\n    }\n}";
        let out = disguise_braced_conditionals(source, FlagPlacement::After, &mut names);
        assert!(out.contains("    else if (c) {"), "{out}");
    }

    #[test]
    fn disguised_conditional_keeps_line_indent() {
        let mut names = NameSupply::seeded(5);
        let out = disguise_braced_conditionals(
            "void f() {\n    if (x > 1) {\n    }\n}",
            FlagPlacement::After,
            &mut names,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[1].starts_with("    int "));
        assert!(lines[2].starts_with("    if (("));
    }
}
