//! Naming and defaulting rules shared by every emitter.

use crate::ir::{ParsedType, TypeKind};

/// C# reserved keywords; contextual keywords are legal identifiers.
const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// JavaScript reserved words that cannot name a glue parameter.
const JS_RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield", "let", "static",
    "implements", "interface", "package", "private", "protected", "public", "await",
];

fn segments(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
}

fn upper_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `game-center` -> `GameCenter`, `getItem` -> `GetItem`, `IAP` -> `IAP`.
pub fn to_pascal_case(s: &str) -> String {
    let joined: String = segments(s).map(upper_first).collect();
    if joined.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{joined}")
    } else {
        joined
    }
}

/// `GetItem` -> `getItem`, `game-center` -> `gameCenter`.
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => pascal,
    }
}

pub fn is_csharp_keyword(name: &str) -> bool {
    CSHARP_KEYWORDS.contains(&name)
}

/// `event` -> `@event`.
pub fn escape_csharp(name: &str) -> String {
    if is_csharp_keyword(name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

/// A C# parameter name for a declared parameter.
pub fn csharp_param_name(name: &str) -> String {
    let camel = to_camel_case(name);
    let camel = if camel.is_empty() { "arg".to_string() } else { camel };
    escape_csharp(&camel)
}

/// A JavaScript parameter name for a declared parameter.
pub fn js_param_name(name: &str) -> String {
    let camel = to_camel_case(name);
    if camel.is_empty() || JS_RESERVED.contains(&camel.as_str()) {
        format!("{camel}Arg")
    } else {
        camel
    }
}

/// Member name for an enum value: `"front-camera"` -> `FrontCamera`.
pub fn enum_member_name(value: &str) -> String {
    let pascal = to_pascal_case(value);
    if pascal.is_empty() {
        "Empty".to_string()
    } else {
        pascal
    }
}

/// Synthetic class name for an inline object: `{Owner}{Member}`.
pub fn synthetic_name(owner: &str, member: &str) -> String {
    format!("{}{}", to_pascal_case(owner), to_pascal_case(member))
}

/// Name of the class describing an API's result.
pub fn result_class_name(api_display_name: &str) -> String {
    format!("{api_display_name}Result")
}

/// Default C# value returned when a call cannot complete: `false`, `0`,
/// `""` for anything carried as a string, `default(T)` for enums, `null`
/// otherwise.
pub fn csharp_default(ty: &ParsedType, csharp_type: &str) -> String {
    if csharp_type.ends_with('?') {
        return "null".to_string();
    }
    match (&ty.kind, ty.name.as_str()) {
        (TypeKind::Primitive, "boolean") => "false".to_string(),
        (TypeKind::Primitive, "number") => "0".to_string(),
        _ if csharp_type == "string" => "\"\"".to_string(),
        (TypeKind::Union { discriminant: None, .. }, _) => format!("default({csharp_type})"),
        _ => "null".to_string(),
    }
}

/// Default JavaScript value a sync glue entry returns on failure. It decodes
/// on the native side to the same value [`csharp_default`] gives.
pub fn js_default(ty: &ParsedType) -> String {
    match (&ty.kind, ty.name.as_str()) {
        (TypeKind::Primitive, "boolean") | (TypeKind::Primitive, "number") => "0".to_string(),
        (TypeKind::Primitive, "void") => String::new(),
        (TypeKind::Primitive, "string") => "AIT.allocString('')".to_string(),
        // Unnamed literal unions cross as plain strings.
        (TypeKind::Union { discriminant: None, .. }, "") => "AIT.allocString('')".to_string(),
        // Named ones are enums; `default(T)` is the first member.
        (TypeKind::Union { discriminant: None, .. }, _) => match ty.union_literals().first() {
            Some(first) => format!("AIT.allocJson(\"{}\")", escape_js(first)),
            None => "AIT.allocString('null')".to_string(),
        },
        _ => "AIT.allocString('null')".to_string(),
    }
}

fn escape_js(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
