//! Per-language word tables: declaration type keywords and the names that
//! must survive renaming untouched.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Program entry point, never renamed in C or C++
pub const ENTRY_POINT: &str = "main";

/// C declaration keywords. Multi-word types come first so they win the
/// alternation over their single-word prefixes.
pub const C_TYPES: &[&str] = &[
    "long long",
    "long double",
    "int",
    "float",
    "double",
    "char",
    "long",
    "short",
    "unsigned",
    "signed",
    "void",
    "struct",
    "enum",
];

/// C++ declaration keywords: the C list without `struct`/`enum`, plus common
/// value types and standard containers.
pub const CPP_TYPES: &[&str] = &[
    "long long",
    "long double",
    "int",
    "float",
    "double",
    "char",
    "long",
    "short",
    "unsigned",
    "signed",
    "void",
    "bool",
    "auto",
    "string",
    "vector",
    "map",
    "set",
    "list",
    "deque",
    "queue",
    "stack",
];

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "bool", "true",
    "false", "NULL",
];

const C_STD_FUNCTIONS: &[&str] = &[
    "printf", "scanf", "malloc", "free", "calloc", "realloc", "strlen", "strcpy", "strncpy",
    "strcmp", "strncmp", "fopen", "fclose", "fread", "fwrite", "fprintf", "exit", "abort",
    "system", "puts", "putchar", "getchar", "gets", "fgets", "fputs", "sprintf", "snprintf",
    "sscanf", "fscanf", "memcpy", "memset", "memmove", "memcmp", "strcat", "strchr", "strstr",
    "atoi", "atof", "rand", "srand", "time", "sqrt", "pow", "abs",
];

const CPP_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "default", "break", "continue",
    "return", "goto", "try", "catch", "throw", "int", "long", "double", "float", "bool", "void",
    "char", "short", "unsigned", "signed", "auto", "const", "constexpr", "static", "inline",
    "extern", "mutable", "volatile", "virtual", "explicit", "friend", "operator", "namespace",
    "using", "class", "struct", "union", "enum", "template", "typename", "typedef", "public",
    "private", "protected", "this", "new", "delete", "sizeof", "typeof", "decltype", "alignof",
    "noexcept", "nullptr", "true", "false", "static_cast", "dynamic_cast", "const_cast",
    "reinterpret_cast", "static_assert", "override", "final",
];

/// Standard-library names whose calls look exactly like user signatures
const CPP_STD_CALLS: &[&str] = &[
    "getchar", "printf", "scanf", "puts", "fopen", "fclose", "fread", "fwrite", "read", "write",
    "getline", "malloc", "free", "strlen", "strcmp", "memcpy", "memset", "exit", "abort",
    "system", "push_back", "pop_back", "emplace_back", "push", "pop", "top", "size", "empty",
    "clear", "begin", "end", "insert", "erase", "find", "at", "front", "back", "c_str",
    "length", "substr", "swap", "sort", "reverse", "make_pair", "make_shared", "make_unique",
    "move", "forward", "to_string", "stoi", "stod", "max", "min", "abs", "sqrt", "pow",
];

/// Standard-library class templates that are never treated as user classes
pub const CPP_STD_TYPES: &[&str] = &[
    "string", "vector", "map", "set", "list", "deque", "queue", "stack", "array", "bitset",
    "pair", "tuple", "unique_ptr", "shared_ptr", "weak_ptr",
];

const PYTHON_RESERVED: &[&str] = &[
    "self", "cls", "print", "input", "len", "range", "list", "dict", "set", "tuple", "int",
    "str", "float", "bool", "bytes", "type", "object", "super", "open", "chr", "ord", "min",
    "max", "sum", "abs", "map", "filter", "zip", "enumerate", "sorted", "reversed",
    "isinstance", "Exception", "True", "False", "None", "and", "or", "not", "in", "is", "if",
    "else", "elif", "for", "while", "break", "continue", "pass", "try", "except", "finally",
    "raise", "with", "def", "class", "lambda", "return", "yield", "from", "import", "as",
    "global", "nonlocal", "del", "assert", "async", "await", "__name__", "end", "sep", "key",
    "reverse",
];

/// A language's immutable set of names that may never be renamed
#[derive(Debug)]
pub struct ProtectedNames {
    names: HashSet<&'static str>,
}

impl ProtectedNames {
    fn from_lists(lists: &[&[&'static str]]) -> Self {
        Self {
            names: lists.iter().flat_map(|list| list.iter().copied()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

pub static C_PROTECTED: Lazy<ProtectedNames> =
    Lazy::new(|| ProtectedNames::from_lists(&[&[ENTRY_POINT], C_KEYWORDS, C_STD_FUNCTIONS]));

pub static CPP_PROTECTED: Lazy<ProtectedNames> = Lazy::new(|| {
    ProtectedNames::from_lists(&[&[ENTRY_POINT], CPP_KEYWORDS, CPP_STD_CALLS, C_STD_FUNCTIONS])
});

pub static PYTHON_PROTECTED: Lazy<ProtectedNames> =
    Lazy::new(|| ProtectedNames::from_lists(&[PYTHON_RESERVED]));

/// Whether any native language refuses `name` as a fresh identifier
pub fn is_reserved(name: &str) -> bool {
    C_PROTECTED.contains(name) || CPP_PROTECTED.contains(name) || PYTHON_PROTECTED.contains(name)
}

pub fn is_cpp_std_type(name: &str) -> bool {
    CPP_STD_TYPES.contains(&name)
}
