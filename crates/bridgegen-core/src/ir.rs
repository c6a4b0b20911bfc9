//! The closed intermediate representation shared by every stage after
//! extraction.
//!
//! Everything here is plain data: built once by the extractor and the
//! mapper, then only read by the emitters and `inspect`.

use std::path::PathBuf;

use serde::Serialize;

/// One callable surface of the bridge library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedAPI {
    /// camelCase identifier, unique within the category.
    pub name: String,
    /// PascalCase identifier used by the native stubs.
    pub display_name: String,
    /// Dotted access path in the bridge library (`IAP.getProductItemList`).
    pub original_name: String,
    pub category: String,
    pub parameters: Vec<ParsedParameter>,
    pub return_type: ParsedType,
    pub is_async: bool,
    pub is_callback_based: bool,
    pub is_event_subscription: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data_type: Option<ParsedType>,
    pub has_permission: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    /// `on*` members of a callback-based API besides the resolve/reject pair.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub named_callbacks: Vec<NamedCallback>,
    pub source_file: PathBuf,
}

impl ParsedAPI {
    /// Identity of the API across a run.
    pub fn key(&self) -> (&str, &str) {
        (&self.category, &self.name)
    }

    /// The object parameter carrying the callbacks of a callback-based API.
    pub fn callback_parameter(&self) -> Option<&ParsedParameter> {
        if self.is_callback_based {
            self.parameters.last()
        } else {
            None
        }
    }

    /// Payload delivered by a successful async call, if any.
    pub fn resolved_type(&self) -> Option<&ParsedType> {
        match &self.return_type.kind {
            TypeKind::Promise { inner } if !inner.is_void() => Some(inner),
            TypeKind::Promise { .. } => None,
            _ if self.return_type.is_void() => None,
            _ => Some(&self.return_type),
        }
    }
}

/// A named `on*` callback of a callback-based API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCallback {
    pub name: String,
    /// Type of the callback's first parameter; `None` for `() => void`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<ParsedType>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParsedType,
    pub optional: bool,
    /// `...name: T[]`; the glue spreads the decoded array back into
    /// positional arguments.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParsedType,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A mapped type.
///
/// `name` is the declared name (`string`, `UserInfo`, an alias) or empty for
/// anonymous shapes; `raw` is the declaration text the type came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedType {
    pub name: String,
    pub raw: String,
    #[serde(flatten)]
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// `string`, `number`, `boolean` or `void`, named by `ParsedType::name`.
    Primitive,
    Object {
        properties: Vec<ParsedProperty>,
    },
    Array {
        element: Box<ParsedType>,
    },
    Function {
        params: Vec<ParsedParameter>,
        returns: Box<ParsedType>,
    },
    Promise {
        inner: Box<ParsedType>,
    },
    Union {
        members: Vec<ParsedType>,
        #[serde(skip_serializing_if = "Option::is_none")]
        discriminant: Option<Discriminant>,
    },
}

/// How a discriminated union selects its active variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discriminant {
    pub tag_field: String,
    pub form: DiscriminantForm,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscriminantForm {
    /// Every member is an object carrying a distinct literal in `tag_field`.
    Tagged,
    /// One object member plus bare string error codes; the tag is synthesized.
    ErrorCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub tag: String,
    pub properties: Vec<ParsedProperty>,
}

impl ParsedType {
    pub fn primitive(name: &str) -> Self {
        ParsedType {
            name: name.to_string(),
            raw: name.to_string(),
            kind: TypeKind::Primitive,
        }
    }

    /// A string primitive remembering its literal value in `raw`.
    pub fn string_literal(value: &str) -> Self {
        ParsedType {
            name: "string".to_string(),
            raw: format!("\"{value}\""),
            kind: TypeKind::Primitive,
        }
    }

    /// The generic fallback: an object named `any`.
    pub fn any() -> Self {
        ParsedType {
            name: "any".to_string(),
            raw: "any".to_string(),
            kind: TypeKind::Object {
                properties: Vec::new(),
            },
        }
    }

    pub fn void() -> Self {
        Self::primitive("void")
    }

    /// The `() => void` returned by subscriptions.
    pub fn unsubscribe() -> Self {
        ParsedType {
            name: String::new(),
            raw: "() => void".to_string(),
            kind: TypeKind::Function {
                params: Vec::new(),
                returns: Box::new(Self::void()),
            },
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_primitive(&self, name: &str) -> bool {
        matches!(self.kind, TypeKind::Primitive) && self.name == name
    }

    pub fn is_void(&self) -> bool {
        self.is_primitive("void")
    }

    pub fn is_any(&self) -> bool {
        matches!(&self.kind, TypeKind::Object { properties } if properties.is_empty())
            && self.name == "any"
    }

    pub fn is_promise(&self) -> bool {
        matches!(self.kind, TypeKind::Promise { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeKind::Function { .. })
    }

    /// The literal value of a string-literal primitive.
    pub fn literal_value(&self) -> Option<&str> {
        if !self.is_primitive("string") {
            return None;
        }
        self.raw
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
    }

    pub fn properties(&self) -> &[ParsedProperty] {
        match &self.kind {
            TypeKind::Object { properties } => properties,
            _ => &[],
        }
    }

    pub fn discriminant(&self) -> Option<&Discriminant> {
        match &self.kind {
            TypeKind::Union { discriminant, .. } => discriminant.as_ref(),
            _ => None,
        }
    }

    /// Literal values of a string-literal union, in declaration order.
    pub fn union_literals(&self) -> Vec<&str> {
        match &self.kind {
            TypeKind::Union {
                members,
                discriminant: None,
            } => members.iter().filter_map(|m| m.literal_value()).collect(),
            _ => Vec::new(),
        }
    }
}

/// A named type emitted into the shared types file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTypeDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: DefinitionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefinitionKind {
    Enum { values: Vec<EnumValue> },
    Interface { properties: Vec<ParsedProperty> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    /// Member name as declared, or the literal itself for literal unions.
    pub name: String,
    pub value: String,
    pub numeric: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_value_requires_quotes() {
        assert_eq!(ParsedType::string_literal("ok").literal_value(), Some("ok"));
        assert_eq!(ParsedType::primitive("string").literal_value(), None);
    }

    #[test]
    fn resolved_type_unwraps_promise() {
        let api = ParsedAPI {
            name: "getUser".to_string(),
            display_name: "GetUser".to_string(),
            original_name: "getUser".to_string(),
            category: "auth".to_string(),
            parameters: Vec::new(),
            return_type: ParsedType {
                name: "Promise".to_string(),
                raw: "Promise<string>".to_string(),
                kind: TypeKind::Promise {
                    inner: Box::new(ParsedType::primitive("string")),
                },
            },
            is_async: true,
            is_callback_based: false,
            is_event_subscription: false,
            event_name: None,
            event_data_type: None,
            has_permission: false,
            description: None,
            return_description: None,
            examples: Vec::new(),
            named_callbacks: Vec::new(),
            source_file: PathBuf::from("auth.d.ts"),
        };
        assert!(api.resolved_type().is_some_and(|t| t.is_primitive("string")));
        assert_eq!(api.key(), ("auth", "getUser"));
    }

    #[test]
    fn serializes_kind_tag() {
        let json = serde_json::to_value(ParsedType::any()).unwrap();
        assert_eq!(json["kind"], "object");
        assert_eq!(json["name"], "any");
    }
}
