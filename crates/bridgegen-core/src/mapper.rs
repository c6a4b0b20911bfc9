//! Maps declaration types onto the closed IR.
//!
//! Mapping is total: whatever cannot be expressed degrades to an object
//! named `any` and leaves a `TypeMappingFallback` diagnostic behind.

use std::path::{Path, PathBuf};

use bridgegen_dts::{
    DtsType, EnumValue as DtsEnumValue, FunctionType, JsDoc, ObjectMember, Param, Primitive,
};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::emit::naming::to_pascal_case;
use crate::ir::{
    Discriminant, DiscriminantForm, ParsedParameter, ParsedProperty, ParsedType, TypeKind, Variant,
};
use crate::resolver::{call_signature, instantiate, members_of, value_type, TypeDecl, TypeResolver};

/// Tag field synthesized for success/error-code unions.
pub const ERROR_CODE_TAG: &str = "_type";

/// Variant tag given to the object member of a success/error-code union.
pub const SUCCESS_TAG: &str = "success";

const MAX_ALIAS_DEPTH: usize = 24;

pub struct TypeMapper<'r> {
    resolver: &'r dyn TypeResolver,
    /// Named types currently being expanded, for cutting cycles.
    expanding: Vec<String>,
    /// Type parameters in scope with their constraint.
    type_params: Vec<(String, Option<DtsType>)>,
    diagnostics: Diagnostics,
    api: Option<String>,
    file: Option<PathBuf>,
}

impl<'r> TypeMapper<'r> {
    pub fn new(resolver: &'r dyn TypeResolver) -> Self {
        TypeMapper {
            resolver,
            expanding: Vec::new(),
            type_params: Vec::new(),
            diagnostics: Diagnostics::new(),
            api: None,
            file: None,
        }
    }

    pub fn resolver(&self) -> &'r dyn TypeResolver {
        self.resolver
    }

    /// Attributes subsequent diagnostics to an API and file.
    pub fn set_context(&mut self, api: Option<&str>, file: Option<&Path>) {
        self.api = api.map(str::to_string);
        self.file = file.map(Path::to_path_buf);
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Maps a type. Never fails.
    pub fn map_type(&mut self, ty: &DtsType) -> ParsedType {
        self.map_inner(ty, false)
    }

    /// Maps a type and reports whether it admits `null`/`undefined`.
    pub fn map_optional(&mut self, ty: &DtsType) -> (ParsedType, bool) {
        let nullable = self.is_nullable(ty, 0);
        (self.map_inner(ty, false), nullable)
    }

    /// Maps a function signature into parameters and a return type.
    pub fn map_signature(
        &mut self,
        f: &FunctionType,
        doc: Option<&JsDoc>,
    ) -> (Vec<ParsedParameter>, ParsedType) {
        let scope = self.push_type_params(f);
        let params = self.map_params(&f.params, doc);
        let returns = self.map_inner(&f.return_type, false);
        self.type_params.truncate(scope);
        (params, returns)
    }

    /// Maps parameters: patterns become `options`, `options1`, …; a lone
    /// `void` parameter disappears; rest parameters become arrays.
    pub fn map_params(&mut self, params: &[Param], doc: Option<&JsDoc>) -> Vec<ParsedParameter> {
        if let [only] = params {
            if matches!(only.ty.unparen(), DtsType::Primitive(Primitive::Void)) {
                return Vec::new();
            }
        }

        let mut patterns = 0usize;
        params
            .iter()
            .map(|param| {
                let name = if param.pattern {
                    let name = if patterns == 0 {
                        "options".to_string()
                    } else {
                        format!("options{patterns}")
                    };
                    patterns += 1;
                    name
                } else {
                    param.name.clone()
                };

                let (mut ty, nullable) = self.map_optional(&param.ty);
                if param.rest && !matches!(ty.kind, TypeKind::Array { .. }) {
                    ty = ParsedType {
                        name: String::new(),
                        raw: format!("{}[]", param.ty),
                        kind: TypeKind::Array {
                            element: Box::new(ty),
                        },
                    };
                }

                let description = doc
                    .and_then(|d| d.param(&param.name))
                    .filter(|text| !text.is_empty())
                    .map(str::to_string);

                ParsedParameter {
                    name,
                    ty,
                    optional: param.optional || param.rest || nullable,
                    rest: param.rest,
                    description,
                }
            })
            .collect()
    }

    fn fallback(&mut self, ty: &DtsType, why: &str) -> ParsedType {
        let mut diagnostic = Diagnostic::new(
            DiagnosticKind::TypeMappingFallback,
            format!("{why}: `{ty}`; using object"),
        );
        if let Some(file) = &self.file {
            diagnostic = diagnostic.with_file(file.clone());
        }
        if let Some(api) = &self.api {
            diagnostic = diagnostic.with_api(api.clone());
        }
        self.diagnostics.push(diagnostic);
        ParsedType::any().with_raw(ty.to_string())
    }

    fn push_type_params(&mut self, f: &FunctionType) -> usize {
        let scope = self.type_params.len();
        for tp in &f.type_params {
            self.type_params
                .push((tp.name.clone(), tp.constraint.clone()));
        }
        scope
    }

    fn is_nullable(&self, ty: &DtsType, depth: usize) -> bool {
        if depth > MAX_ALIAS_DEPTH {
            return false;
        }
        match ty.unparen() {
            DtsType::Primitive(Primitive::Null | Primitive::Undefined) => true,
            DtsType::Union(members) => members.iter().any(|m| self.is_nullable(m, depth + 1)),
            DtsType::Named { name, type_args } => match self.resolver.resolve_type(name) {
                Some(TypeDecl::Alias(alias)) => {
                    let body = instantiate(&alias.type_params, type_args, &alias.ty);
                    self.is_nullable(&body, depth + 1)
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn map_inner(&mut self, ty: &DtsType, allow_discriminant: bool) -> ParsedType {
        let raw = ty.to_string();
        match ty {
            DtsType::Parenthesized(inner) => self.map_inner(inner, allow_discriminant),
            DtsType::Primitive(p) => map_primitive(*p),
            DtsType::StringLiteral(s) => ParsedType::string_literal(s),
            DtsType::NumberLiteral(n) => ParsedType::primitive("number").with_raw(n.clone()),
            DtsType::BooleanLiteral(b) => ParsedType::primitive("boolean").with_raw(b.to_string()),
            DtsType::TemplateLiteral(_) => ParsedType::primitive("string").with_raw(raw),
            DtsType::Union(members) => self.map_union(ty, members, allow_discriminant),
            DtsType::Intersection(parts) => self.map_intersection(ty, parts),
            DtsType::Function(f) => self.map_function(f),
            DtsType::Object(members) => self.map_object(ty, members, String::new()),
            DtsType::Array(inner) => ParsedType {
                name: String::new(),
                raw,
                kind: TypeKind::Array {
                    element: Box::new(self.map_inner(inner, false)),
                },
            },
            DtsType::Tuple(elements) => {
                let element = match elements.first() {
                    Some(first) => self.map_inner(&first.ty, false),
                    None => ParsedType::any(),
                };
                ParsedType {
                    name: String::new(),
                    raw,
                    kind: TypeKind::Array {
                        element: Box::new(element),
                    },
                }
            }
            DtsType::TypeOf(path) => match value_type(self.resolver, path) {
                Some(value) => self.map_inner(&value, allow_discriminant),
                None => self.fallback(ty, "unresolved value"),
            },
            DtsType::KeyOf(inner) => match members_of(self.resolver, inner) {
                Some(members) => {
                    let keys: Vec<ParsedType> = members
                        .iter()
                        .filter_map(ObjectMember::name)
                        .map(ParsedType::string_literal)
                        .collect();
                    if keys.is_empty() {
                        ParsedType::primitive("string")
                    } else {
                        ParsedType {
                            name: String::new(),
                            raw,
                            kind: TypeKind::Union {
                                members: keys,
                                discriminant: None,
                            },
                        }
                    }
                }
                None => ParsedType::primitive("string").with_raw(raw),
            },
            DtsType::IndexAccess { object, index } => self.map_index_access(ty, object, index),
            // Mapped types are dictionaries as far as the stubs are concerned.
            DtsType::Mapped { .. } => ParsedType::any().with_raw(raw),
            DtsType::Named { name, type_args } => {
                self.map_named(ty, name, type_args, allow_discriminant)
            }
            DtsType::Constructor(_)
            | DtsType::Conditional { .. }
            | DtsType::Infer(_)
            | DtsType::This => self.fallback(ty, "unsupported type"),
        }
    }

    fn map_function(&mut self, f: &FunctionType) -> ParsedType {
        let (params, returns) = self.map_signature(f, None);
        ParsedType {
            name: String::new(),
            raw: f.to_string(),
            kind: TypeKind::Function {
                params,
                returns: Box::new(returns),
            },
        }
    }

    fn map_properties(&mut self, members: &[ObjectMember]) -> Vec<ParsedProperty> {
        let mut properties: Vec<ParsedProperty> = Vec::new();
        for member in members {
            let property = match member {
                ObjectMember::Property(p) => {
                    let (ty, nullable) = self.map_optional(&p.ty);
                    ParsedProperty {
                        name: p.name.clone(),
                        ty,
                        optional: p.optional || nullable,
                        description: describe(p.doc.as_ref()),
                    }
                }
                ObjectMember::Method(m) => ParsedProperty {
                    name: m.name.clone(),
                    ty: self.map_function(&m.as_function_type()),
                    optional: m.optional,
                    description: describe(m.doc.as_ref()),
                },
                _ => continue,
            };
            if let Some(slot) = properties.iter_mut().find(|p| p.name == property.name) {
                *slot = property;
            } else {
                properties.push(property);
            }
        }
        properties
    }

    fn map_object(&mut self, ty: &DtsType, members: &[ObjectMember], name: String) -> ParsedType {
        let has_named = members.iter().any(|m| m.name().is_some());
        if !has_named {
            let call = members.iter().rev().find_map(|m| match m {
                ObjectMember::CallSignature(sig) => Some(sig.as_function_type()),
                _ => None,
            });
            return match call {
                Some(f) => self.map_function(&f),
                // `{}`, index signatures only, construct signatures only.
                None => ParsedType::any().with_raw(ty.to_string()),
            };
        }
        let properties = self.map_properties(members);
        ParsedType {
            name,
            raw: ty.to_string(),
            kind: TypeKind::Object { properties },
        }
    }

    fn map_index_access(&mut self, ty: &DtsType, object: &DtsType, index: &DtsType) -> ParsedType {
        // `Parameters<typeof f>[N]`
        if let DtsType::Named { name, type_args } = object.unparen() {
            if name == "Parameters" {
                if let (Some(target), DtsType::NumberLiteral(n)) = (type_args.first(), index.unparen()) {
                    let param = n
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| call_signature(self.resolver, target)?.params.get(i).cloned());
                    return match param {
                        Some(param) => self.map_inner(&param.ty, false),
                        None => self.fallback(ty, "parameter index out of range"),
                    };
                }
            }
        }
        if let DtsType::StringLiteral(key) = index.unparen() {
            if let Some(members) = members_of(self.resolver, object) {
                let found = members
                    .iter()
                    .find(|m| m.name() == Some(key.as_str()))
                    .and_then(crate::resolver::member_type);
                if let Some(member) = found {
                    return self.map_inner(&member, false);
                }
            }
        }
        self.fallback(ty, "unresolved indexed access")
    }

    fn map_named(
        &mut self,
        ty: &DtsType,
        name: &str,
        args: &[DtsType],
        allow_discriminant: bool,
    ) -> ParsedType {
        let raw = ty.to_string();

        if let Some(pos) = self.type_params.iter().rposition(|(tp, _)| tp == name) {
            return match self.type_params[pos].1.clone() {
                Some(constraint) => self.map_inner(&constraint, allow_discriminant),
                None => ParsedType::any().with_raw(raw),
            };
        }

        let first = args.first();
        match name {
            "Promise" | "PromiseLike" => {
                let mut inner = match first {
                    Some(arg) => self.map_inner(arg, true),
                    None => ParsedType::void(),
                };
                // Only one level of promise is modelled.
                if inner.is_promise() {
                    inner = ParsedType::any().with_raw(inner.raw);
                }
                return ParsedType {
                    name: "Promise".to_string(),
                    raw,
                    kind: TypeKind::Promise {
                        inner: Box::new(inner),
                    },
                };
            }
            "Array" | "ReadonlyArray" => {
                let element = match first {
                    Some(arg) => self.map_inner(arg, false),
                    None => ParsedType::any(),
                };
                return ParsedType {
                    name: String::new(),
                    raw,
                    kind: TypeKind::Array {
                        element: Box::new(element),
                    },
                };
            }
            "Record" | "Map" | "ReadonlyMap" | "WeakMap" => return ParsedType::any().with_raw(raw),
            "Partial" | "Required" | "Readonly" | "NonNullable" => {
                let Some(arg) = first else {
                    return self.fallback(ty, "missing type argument");
                };
                let mut mapped = self.map_inner(arg, allow_discriminant);
                if let TypeKind::Object { properties } = &mut mapped.kind {
                    match name {
                        "Partial" => properties.iter_mut().for_each(|p| p.optional = true),
                        "Required" => properties.iter_mut().for_each(|p| p.optional = false),
                        _ => {}
                    }
                }
                return mapped;
            }
            "Awaited" => {
                let Some(arg) = first else {
                    return self.fallback(ty, "missing type argument");
                };
                let mapped = self.map_inner(arg, allow_discriminant);
                return match mapped {
                    ParsedType {
                        kind: TypeKind::Promise { inner },
                        ..
                    } => *inner,
                    other => other,
                };
            }
            "ReturnType" => {
                let returns = first.and_then(|arg| call_signature(self.resolver, arg));
                return match returns {
                    Some(f) => self.map_inner(&f.return_type, allow_discriminant),
                    None => self.fallback(ty, "unresolved ReturnType"),
                };
            }
            _ => {}
        }

        let display = display_name(name, args);
        if self.expanding.iter().any(|n| n == &display) {
            return ParsedType {
                name: display,
                raw,
                kind: TypeKind::Object {
                    properties: Vec::new(),
                },
            };
        }
        if self.expanding.len() > MAX_ALIAS_DEPTH {
            return self.fallback(ty, "type nested too deeply");
        }

        let Some(decl) = self.resolver.resolve_type(name) else {
            return self.fallback(ty, "unresolved type");
        };

        self.expanding.push(display.clone());
        let mapped = match decl {
            TypeDecl::Alias(alias) => {
                let body = instantiate(&alias.type_params, args, &alias.ty);
                let mapped = self.map_inner(&body, allow_discriminant);
                let labels = match &mapped.kind {
                    TypeKind::Object { .. } => !mapped.is_any(),
                    TypeKind::Union { .. } => true,
                    _ => false,
                };
                if labels {
                    mapped.with_name(display)
                } else {
                    mapped
                }
            }
            TypeDecl::Interface(_) | TypeDecl::Class(_) => match members_of(self.resolver, ty) {
                Some(members) => self.map_object(ty, &members, display),
                None => self.fallback(ty, "unresolved members"),
            },
            TypeDecl::Enum(e) => {
                let mut next = 0i64;
                let members = e
                    .members
                    .iter()
                    .map(|member| match &member.value {
                        Some(DtsEnumValue::String(s)) => ParsedType::string_literal(s),
                        Some(DtsEnumValue::Number(n)) => {
                            next = n.parse::<i64>().map(|v| v + 1).unwrap_or(next + 1);
                            ParsedType::primitive("number").with_raw(n.clone())
                        }
                        None => {
                            let value = next;
                            next += 1;
                            ParsedType::primitive("number").with_raw(value.to_string())
                        }
                    })
                    .collect();
                ParsedType {
                    name: display,
                    raw,
                    kind: TypeKind::Union {
                        members,
                        discriminant: None,
                    },
                }
            }
        };
        self.expanding.pop();
        mapped
    }

    fn map_union(&mut self, ty: &DtsType, members: &[DtsType], allow_discriminant: bool) -> ParsedType {
        let mut flat = Vec::new();
        flatten_union(members, &mut flat);
        let concrete: Vec<&DtsType> = flat
            .into_iter()
            .filter(|m| {
                !matches!(
                    m,
                    DtsType::Primitive(Primitive::Null | Primitive::Undefined | Primitive::Void)
                )
            })
            .collect();

        match concrete.as_slice() {
            [] => return ParsedType::void().with_raw(ty.to_string()),
            [single] => return self.map_inner(single, allow_discriminant),
            _ => {}
        }

        let mut mapped: Vec<ParsedType> = Vec::new();
        for member in concrete {
            match self.map_inner(member, false) {
                ParsedType {
                    kind:
                        TypeKind::Union {
                            members,
                            discriminant: None,
                        },
                    ..
                } => mapped.extend(members),
                other => mapped.push(other),
            }
        }

        let raw = ty.to_string();
        let all_primitive = mapped.iter().all(|m| matches!(m.kind, TypeKind::Primitive));

        if all_primitive && mapped.iter().all(|m| m.literal_value().is_some()) {
            let mut literals: Vec<ParsedType> = Vec::new();
            for m in mapped {
                if !literals.iter().any(|l| l.raw == m.raw) {
                    literals.push(m);
                }
            }
            return ParsedType {
                name: String::new(),
                raw,
                kind: TypeKind::Union {
                    members: literals,
                    discriminant: None,
                },
            };
        }
        if all_primitive {
            let base = &mapped[0].name;
            if mapped.iter().all(|m| &m.name == base) {
                return ParsedType::primitive(base).with_raw(raw);
            }
        }

        if allow_discriminant {
            if let Some(discriminant) = error_code_form(&mapped).or_else(|| tagged_form(&mapped)) {
                return ParsedType {
                    name: String::new(),
                    raw,
                    kind: TypeKind::Union {
                        members: mapped,
                        discriminant: Some(discriminant),
                    },
                };
            }
        }

        self.fallback(ty, "mixed union")
    }

    fn map_intersection(&mut self, ty: &DtsType, parts: &[DtsType]) -> ParsedType {
        let mapped: Vec<ParsedType> = parts
            .iter()
            .map(|part| self.map_inner(part, false))
            .filter(|m| !m.is_any())
            .collect();

        // Branded primitives: `string & { __brand: "Id" }`.
        if let Some(primitive) = mapped.iter().find(|m| matches!(m.kind, TypeKind::Primitive)) {
            return primitive.clone().with_raw(ty.to_string());
        }
        // Callable objects keep their call signature.
        if let Some(function) = mapped.iter().find(|m| m.is_function()) {
            return function.clone();
        }
        if !mapped.is_empty() && mapped.iter().all(|m| matches!(m.kind, TypeKind::Object { .. })) {
            let mut properties: Vec<ParsedProperty> = Vec::new();
            for m in &mapped {
                for p in m.properties() {
                    if !properties.iter().any(|existing| existing.name == p.name) {
                        properties.push(p.clone());
                    }
                }
            }
            return ParsedType {
                name: String::new(),
                raw: ty.to_string(),
                kind: TypeKind::Object { properties },
            };
        }
        if mapped.is_empty() {
            return ParsedType::any().with_raw(ty.to_string());
        }
        self.fallback(ty, "unsupported intersection")
    }
}

fn map_primitive(p: Primitive) -> ParsedType {
    match p {
        Primitive::String => ParsedType::primitive("string"),
        Primitive::Number | Primitive::BigInt => ParsedType::primitive("number"),
        Primitive::Boolean => ParsedType::primitive("boolean"),
        Primitive::Void | Primitive::Never | Primitive::Null | Primitive::Undefined => {
            ParsedType::void().with_raw(p.to_string())
        }
        Primitive::Any | Primitive::Unknown | Primitive::Object | Primitive::Symbol => {
            ParsedType::any().with_raw(p.to_string())
        }
    }
}

fn describe(doc: Option<&JsDoc>) -> Option<String> {
    doc.map(|d| d.description.clone()).filter(|d| !d.is_empty())
}

/// `Result<User>` -> `ResultUser`; dotted names keep their last segment.
fn display_name(name: &str, args: &[DtsType]) -> String {
    let base = name.rsplit('.').next().unwrap_or(name).to_string();
    args.iter()
        .fold(base, |acc, arg| acc + &to_pascal_case(&arg.to_string()))
}

fn flatten_union<'a>(members: &'a [DtsType], out: &mut Vec<&'a DtsType>) {
    for member in members {
        match member.unparen() {
            DtsType::Union(inner) => flatten_union(inner, out),
            other => out.push(other),
        }
    }
}

/// One object member plus string error codes.
fn error_code_form(members: &[ParsedType]) -> Option<Discriminant> {
    let objects: Vec<&ParsedType> = members
        .iter()
        .filter(|m| matches!(m.kind, TypeKind::Object { .. }))
        .collect();
    let codes: Vec<&str> = members.iter().filter_map(|m| m.literal_value()).collect();
    if objects.len() != 1 || codes.is_empty() || objects.len() + codes.len() != members.len() {
        return None;
    }
    let mut variants = vec![Variant {
        tag: SUCCESS_TAG.to_string(),
        properties: objects[0].properties().to_vec(),
    }];
    variants.extend(codes.into_iter().map(|code| Variant {
        tag: code.to_string(),
        properties: Vec::new(),
    }));
    Some(Discriminant {
        tag_field: ERROR_CODE_TAG.to_string(),
        form: DiscriminantForm::ErrorCode,
        variants,
    })
}

/// Objects sharing a property whose literal value differs per member.
fn tagged_form(members: &[ParsedType]) -> Option<Discriminant> {
    if members.len() < 2
        || !members
            .iter()
            .all(|m| matches!(m.kind, TypeKind::Object { .. }))
    {
        return None;
    }
    let candidates = members[0]
        .properties()
        .iter()
        .filter(|p| p.ty.literal_value().is_some())
        .map(|p| p.name.as_str());

    for field in candidates {
        let tags: Option<Vec<&str>> = members
            .iter()
            .map(|m| {
                m.properties()
                    .iter()
                    .find(|p| p.name == field)
                    .and_then(|p| p.ty.literal_value())
            })
            .collect();
        let Some(tags) = tags else { continue };
        let distinct = tags
            .iter()
            .enumerate()
            .all(|(i, tag)| !tags[..i].contains(tag));
        if !distinct {
            continue;
        }
        let variants = members
            .iter()
            .zip(tags)
            .map(|(m, tag)| Variant {
                tag: tag.to_string(),
                properties: m
                    .properties()
                    .iter()
                    .filter(|p| p.name != field)
                    .cloned()
                    .collect(),
            })
            .collect();
        return Some(Discriminant {
            tag_field: field.to_string(),
            form: DiscriminantForm::Tagged,
            variants,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Project;
    use crate::resolver::ProjectResolver;
    use bridgegen_dts::parse_type_str;

    fn with_mapper<T>(decls: &str, f: impl FnOnce(&mut TypeMapper<'_>) -> T) -> T {
        let (project, _) = Project::from_sources([("types.d.ts", decls)]);
        let resolver = ProjectResolver::new(&project);
        let mut mapper = TypeMapper::new(&resolver);
        f(&mut mapper)
    }

    fn map(decls: &str, ty: &str) -> (ParsedType, Diagnostics) {
        with_mapper(decls, |mapper| {
            let parsed = mapper.map_type(&parse_type_str(ty).unwrap());
            (parsed, mapper.take_diagnostics())
        })
    }

    #[test]
    fn maps_primitives() {
        assert!(map("", "string").0.is_primitive("string"));
        assert!(map("", "bigint").0.is_primitive("number"));
        assert!(map("", "never").0.is_void());
        assert!(map("", "unknown").0.is_any());
        assert_eq!(map("", "'front'").0.literal_value(), Some("front"));
    }

    #[test]
    fn nullable_unions_collapse() {
        with_mapper("", |mapper| {
            let (ty, nullable) = mapper.map_optional(&parse_type_str("string | null").unwrap());
            assert!(ty.is_primitive("string"));
            assert!(nullable);
        });
    }

    #[test]
    fn string_literal_alias_keeps_name() {
        let (ty, diags) = map("type Facing = 'front' | 'back';", "Facing");
        assert_eq!(ty.name, "Facing");
        assert_eq!(ty.union_literals(), ["front", "back"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn interfaces_merge_extends() {
        let (ty, _) = map(
            "interface Base { id: string }\ninterface User extends Base { name?: string; greet(): void }",
            "User",
        );
        assert_eq!(ty.name, "User");
        let names: Vec<_> = ty.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "greet"]);
        assert!(ty.properties()[1].optional);
        assert!(ty.properties()[2].ty.is_function());
    }

    #[test]
    fn nested_promise_becomes_any() {
        let (ty, _) = map("", "Promise<Promise<string>>");
        match ty.kind {
            TypeKind::Promise { inner } => assert!(inner.is_any()),
            other => panic!("expected promise, got {other:?}"),
        }
    }

    #[test]
    fn record_and_partial() {
        assert!(map("", "Record<string, number>").0.is_any());
        let (ty, _) = map("interface Opts { a: string }", "Partial<Opts>");
        assert!(ty.properties()[0].optional);
    }

    #[test]
    fn error_code_union_inside_promise() {
        let (ty, diags) = map(
            "",
            "Promise<{ orderId: string } | 'USER_CANCELED' | 'NETWORK_ERROR' | undefined>",
        );
        assert!(diags.is_empty());
        let TypeKind::Promise { inner } = ty.kind else {
            panic!("expected promise");
        };
        let discriminant = inner.discriminant().expect("discriminated");
        assert_eq!(discriminant.tag_field, ERROR_CODE_TAG);
        assert_eq!(discriminant.form, DiscriminantForm::ErrorCode);
        let tags: Vec<_> = discriminant.variants.iter().map(|v| v.tag.as_str()).collect();
        assert_eq!(tags, ["success", "USER_CANCELED", "NETWORK_ERROR"]);
    }

    #[test]
    fn tagged_union_inside_promise() {
        let (ty, _) = map(
            "type Outcome = { status: 'ok'; value: number } | { status: 'fail'; reason: string };",
            "Promise<Outcome>",
        );
        let TypeKind::Promise { inner } = ty.kind else {
            panic!("expected promise");
        };
        assert_eq!(inner.name, "Outcome");
        let discriminant = inner.discriminant().expect("discriminated");
        assert_eq!(discriminant.tag_field, "status");
        assert_eq!(discriminant.variants[1].properties[0].name, "reason");
    }

    #[test]
    fn discriminated_union_outside_promise_falls_back() {
        let (ty, diags) = map("", "{ a: string } | 'ERR'");
        assert!(ty.is_any());
        assert_eq!(diags.count(DiagnosticKind::TypeMappingFallback), 1);
    }

    #[test]
    fn cycles_are_cut() {
        let (ty, _) = map("interface Node { value: number; next?: Node }", "Node");
        let next = &ty.properties()[1];
        assert_eq!(next.ty.name, "Node");
        assert!(next.ty.properties().is_empty());
    }

    #[test]
    fn unresolved_names_fall_back() {
        let (ty, diags) = map("", "Missing");
        assert!(ty.is_any());
        assert_eq!(diags.count(DiagnosticKind::TypeMappingFallback), 1);
    }

    #[test]
    fn parameters_are_sanitized() {
        with_mapper("", |mapper| {
            let f = match parse_type_str("({ a }: { a: string }, [b]: number[], ...rest: string[]) => void")
                .unwrap()
            {
                DtsType::Function(f) => f,
                other => panic!("expected function, got {other:?}"),
            };
            let (params, returns) = mapper.map_signature(&f, None);
            let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, ["options", "options1", "rest"]);
            assert!(params[2].rest && !params[1].rest);
            assert!(returns.is_void());

            let lone_void = match parse_type_str("(args_0: void) => void").unwrap() {
                DtsType::Function(f) => f,
                other => panic!("expected function, got {other:?}"),
            };
            assert!(mapper.map_signature(&lone_void, None).0.is_empty());
        });
    }

    #[test]
    fn parameters_of_typeof_resolve() {
        let (ty, _) = map(
            "declare function save(params: { data: string }): Promise<void>;",
            "Parameters<typeof save>[0]",
        );
        assert_eq!(ty.properties()[0].name, "data");
    }

    #[test]
    fn mapping_is_deterministic() {
        let decls = "interface A { b: B[] }\ninterface B { c: 'x' | 'y' }";
        assert_eq!(map(decls, "A").0, map(decls, "A").0);
    }
}
