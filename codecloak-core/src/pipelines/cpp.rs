//! C++: the C renaming extended with classes, members, methods, namespaces
//! and template parameters. `#define` directives are lifted out before any
//! rewriting and put back verbatim at the end.

use super::{
    declaration_pattern, disguise_braced_conditionals, rename_typed_declarations, FlagPlacement,
};
use crate::errors::StageError;
use crate::identifier_map::IdentifierMap;
use crate::lexicon::{is_cpp_std_type, ProtectedNames, CPP_PROTECTED, CPP_TYPES};
use crate::pipeline::{RunContext, Stage};
use crate::rewrite::{rewrite, Edit};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

pub(crate) static STAGES: &[Stage] = &[
    Stage {
        name: "protect-macros",
        apply: protect_macros,
    },
    Stage {
        name: "rename-declarations",
        apply: rename_declarations,
    },
    Stage {
        name: "rename-classes",
        apply: rename_classes,
    },
    Stage {
        name: "rename-namespaces",
        apply: rename_namespaces,
    },
    Stage {
        name: "rename-template-parameters",
        apply: rename_template_parameters,
    },
    Stage {
        name: "append-dead-functions",
        apply: append_dead_functions,
    },
    Stage {
        name: "disguise-conditionals",
        apply: disguise_conditionals,
    },
    Stage {
        name: "restore-macros",
        apply: restore_macros,
    },
];

/// A `#define` line plus any backslash-continued lines after it
static DEFINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#define(?:[^\r\n]*\\\r?\n)*[^\r\n]*").unwrap());

static DECLARATION: Lazy<Regex> = Lazy::new(|| declaration_pattern(CPP_TYPES));

static CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bclass\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*(?::\s*(public|protected|private)\s+([a-zA-Z_][a-zA-Z0-9_]*))?\s*\{",
    )
    .unwrap()
});

static MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(public|protected|private):\s*([a-zA-Z_][a-zA-Z0-9_:<>]*)\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*;",
    )
    .unwrap()
});

static SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b([a-zA-Z_][a-zA-Z0-9_]*)\s*\(([^)]*)\)\s*(const)?\s*(override)?\s*(final)?\s*([{;])",
    )
    .unwrap()
});

static NAMESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnamespace\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*\{").unwrap());

static USING_NAMESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\busing\s+namespace\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*;").unwrap()
});

static TEMPLATE_PARAMETER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\btemplate\s*<\s*(?:class|typename)\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*>").unwrap()
});

fn protect_macros(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    if !DEFINE.is_match(text) {
        return Ok(text.to_string());
    }
    ctx.placeholders.choose_sentinel(text)?;
    let table = &mut ctx.placeholders;
    let lifted = DEFINE.replace_all(text, |caps: &Captures| table.protect(&caps[0]));
    debug!(macros = table.len(), "Protected macro definitions");
    Ok(lifted.into_owned())
}

fn restore_macros(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    ctx.placeholders.restore(text)
}

fn rename_declarations(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    rename_typed_declarations(text, &DECLARATION, &CPP_PROTECTED, true, &mut ctx.names)
}

/// Classes first, then data members, then method signatures. Methods that
/// share a name with a member reuse the member's replacement.
fn rename_classes(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let protected: &ProtectedNames = &CPP_PROTECTED;
    let names = &mut ctx.names;

    let mut classes = IdentifierMap::new();
    let text = rewrite(text, &CLASS, |caps| {
        let name = &caps[1];
        if is_cpp_std_type(name) || protected.contains(name) {
            return Edit::Keep;
        }
        let renamed = classes.assign(name, names, protected);
        match (caps.get(2), caps.get(3)) {
            (Some(access), Some(base)) => {
                let base = classes.get(base.as_str()).unwrap_or(base.as_str());
                Edit::Replace(format!("class {renamed} : {} {base} {{", access.as_str()))
            }
            _ => Edit::Replace(format!("class {renamed} {{")),
        }
    });
    let text = classes.substitute_words(&text)?;

    let mut members = IdentifierMap::new();
    let text = rewrite(&text, &MEMBER, |caps| {
        let name = &caps[3];
        if protected.contains(name) {
            return Edit::Keep;
        }
        let renamed = members.assign(name, names, protected);
        Edit::Replace(format!("{}: {} {renamed};", &caps[1], &caps[2]))
    });

    let mut methods = IdentifierMap::new();
    let text = rewrite(&text, &SIGNATURE, |caps| {
        let Some(name) = caps.get(1) else {
            return Edit::Keep;
        };
        let word = name.as_str();
        if protected.contains(word) {
            return Edit::RetryAt(name.end());
        }
        // constructors and destructors keep the (already renamed) class name
        if classes.is_replacement(word)
            || classes.get(word).is_some()
            || text[..name.start()].trim_end().ends_with('~')
        {
            return Edit::Keep;
        }

        let renamed = match members.get(word) {
            Some(shared) => shared.to_string(),
            None => methods.assign(word, names, protected),
        };
        let qualifiers: String = [caps.get(3), caps.get(4), caps.get(5)]
            .into_iter()
            .flatten()
            .map(|q| format!(" {}", q.as_str()))
            .collect();
        let params = &caps[2];
        Edit::Replace(match &caps[6] {
            "{" => format!("{renamed}({params}){qualifiers} {{"),
            _ => format!("{renamed}({params}){qualifiers};"),
        })
    });

    debug!(
        classes = classes.len(),
        members = members.len(),
        methods = methods.len(),
        "Renamed class structure"
    );
    members.absorb(methods);
    members.substitute_words(&text)
}

fn rename_namespaces(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let protected: &ProtectedNames = &CPP_PROTECTED;
    let names = &mut ctx.names;

    let mut spaces = IdentifierMap::new();
    let text = rewrite(text, &NAMESPACE, |caps| {
        let name = &caps[1];
        if name == "std" {
            return Edit::Keep;
        }
        Edit::Replace(format!("namespace {} {{", spaces.assign(name, names, protected)))
    });
    if spaces.is_empty() {
        return Ok(text);
    }

    let text = spaces.substitute_qualifiers(&text)?;
    Ok(rewrite(&text, &USING_NAMESPACE, |caps| match spaces.get(&caps[1]) {
        Some(renamed) => Edit::Replace(format!("using namespace {renamed};")),
        None => Edit::Keep,
    }))
}

/// Only the `template<...>` header is rewritten; uses of the parameter in
/// the templated body keep the old name.
fn rename_template_parameters(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let protected: &ProtectedNames = &CPP_PROTECTED;
    let names = &mut ctx.names;
    let mut parameters = IdentifierMap::new();
    Ok(rewrite(text, &TEMPLATE_PARAMETER, |caps| {
        Edit::Replace(format!(
            "template<class {}>",
            parameters.assign(&caps[1], names, protected)
        ))
    }))
}

fn append_dead_functions(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    let names = &mut ctx.names;
    let (noop, local) = (names.identifier(), names.identifier());
    let (counter, answer) = (names.identifier(), names.below(100));
    let (ratio, fraction) = (names.identifier(), names.fraction());

    let functions = [
        format!("void {noop}() {{ int {local} = 0; }}"),
        format!("int {counter}() {{ return {answer}; }}"),
        format!("float {ratio}() {{ return {fraction:.6}; }}"),
    ];
    Ok(format!("{text}\n{}", functions.join("\n")))
}

fn disguise_conditionals(text: &str, ctx: &mut RunContext) -> Result<String, StageError> {
    Ok(disguise_braced_conditionals(text, FlagPlacement::Before, &mut ctx.names))
}
