//! C: rename typed declarations, pad blocks with dead locals, disguise
//! conditionals.

use super::{
    declaration_pattern, disguise_braced_conditionals, rename_typed_declarations, FlagPlacement,
};
use crate::errors::StageError;
use crate::lexicon::{C_PROTECTED, C_TYPES};
use crate::names::NameSupply;
use crate::pipeline::{RunContext, Stage};
use crate::rewrite::{rewrite, Edit};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub(crate) static STAGES: &[Stage] = &[
    Stage {
        name: "rename-declarations",
        apply: rename_declarations,
    },
    Stage {
        name: "inject-dead-code",
        apply: inject_dead_code,
    },
    Stage {
        name: "disguise-conditionals",
        apply: disguise_conditionals,
    },
];

static DECLARATION: Lazy<Regex> = Lazy::new(|| declaration_pattern(C_TYPES));

/// A brace block with at most one level of nesting
static BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").unwrap());

static AGGREGATE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:struct|union|enum)(?:\s+[A-Za-z_]\w*)?\s*$").unwrap());

/// How far back to look for a `struct`/`union`/`enum` header before a block
const HEADER_WINDOW: usize = 256;

fn rename_declarations(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    rename_typed_declarations(text, &DECLARATION, &C_PROTECTED, false, &mut ctx.names)
}

fn inject_dead_code(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let names = &mut ctx.names;
    let mut skipped = 0usize;
    let out = rewrite(text, &BLOCK, |caps| {
        let Some(block) = caps.get(0) else {
            return Edit::Keep;
        };
        if opens_data_block(&text[..block.start()]) {
            skipped += 1;
            return Edit::Keep;
        }
        let body = &block.as_str()[1..];
        Edit::Replace(format!("{{\n{}{}", dead_locals(names), body))
    });
    debug!(skipped, "Left data blocks untouched");
    Ok(out)
}

/// Whether the block after `prefix` holds data rather than statements:
/// an initializer list or the body of a struct, union or enum.
fn opens_data_block(prefix: &str) -> bool {
    let prefix = prefix.trim_end();
    if prefix.ends_with(&['=', ',', '{'][..]) {
        return true;
    }
    let mut from = prefix.len().saturating_sub(HEADER_WINDOW);
    while !prefix.is_char_boundary(from) {
        from += 1;
    }
    AGGREGATE_HEADER.is_match(&prefix[from..])
}

/// Two unused locals and a conditional bump, written without braces so the
/// block scanner never sees them as a block of their own
fn dead_locals(names: &mut NameSupply) -> String {
    let counter = names.identifier();
    let ratio = names.identifier();
    let start = names.below(1000);
    let scale = names.fraction() * 100.0;
    let branch = u8::from(names.flip());
    let step = names.below(10);
    format!(
        "    int {counter} = {start};\n    double {ratio} = {scale:.6};\n    if ({branch}) {counter} += {step};\n"
    )
}

fn disguise_conditionals(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    Ok(disguise_braced_conditionals(text, FlagPlacement::After, &mut ctx.names))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(seed: u64) -> RunContext {
        RunContext::new(NameSupply::seeded(seed))
    }

    #[test]
    fn function_bodies_get_dead_locals() {
        let out = inject_dead_code("int main() {\n    return 0;\n}", &mut ctx(1)).unwrap();
        assert!(out.starts_with("int main() {\n    int "));
        assert!(out.contains("    double "));
        assert!(out.ends_with("    return 0;\n}"));
    }

    #[test]
    fn injected_guard_has_no_braces() {
        let out = inject_dead_code("void f() { g(); }", &mut ctx(2)).unwrap();
        assert_eq!(out.matches('{').count(), 1);
        assert_eq!(out.matches('}').count(), 1);
    }

    #[test]
    fn data_blocks_are_left_alone() {
        for source in [
            "int xs[3] = {1, 2, 3};",
            "struct point { int x; int y; };",
            "typedef struct { int a; } pair;",
            "enum color { RED, GREEN };",
            "union { int i; float f; } u;",
        ] {
            let out = inject_dead_code(source, &mut ctx(3)).unwrap();
            assert_eq!(out, source);
        }
    }

    #[test]
    fn blocks_nested_two_deep_are_reached_from_the_inside() {
        let source = "void f() { while (1) { if (x) { y(); } } }";
        let out = inject_dead_code(source, &mut ctx(4)).unwrap();
        assert!(out.len() > source.len());
        assert!(out.starts_with("void f() { while (1) {\n    int "));
    }

    #[test]
    fn conditionals_keep_their_condition() {
        let out = disguise_conditionals("if (a > b) {\n}", &mut ctx(5)).unwrap();
        assert!(out.starts_with("int "));
        assert!(out.contains("if ((a > b) && ("));
    }

    #[test]
    fn braceless_if_is_not_disguised() {
        let source = "if (a) b();";
        assert_eq!(disguise_conditionals(source, &mut ctx(6)).unwrap(), source);
    }

    #[test]
    fn stage_order() {
        let names: Vec<_> = STAGES.iter().map(|stage| stage.name).collect();
        assert_eq!(
            names,
            ["rename-declarations", "inject-dead-code", "disguise-conditionals"]
        );
    }
}
