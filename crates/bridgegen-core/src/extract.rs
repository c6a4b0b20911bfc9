//! Declaration extraction: classifies each exported declaration into one
//! of four shapes and turns it into [`ParsedAPI`]s.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use bridgegen_dts::{DtsExport, DtsFunction, DtsItem, DtsType, DtsVariable, FunctionType, JsDoc, Primitive};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::InputConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::emit::naming::to_pascal_case;
use crate::ir::{NamedCallback, ParsedAPI, ParsedType, TypeKind};
use crate::loader::{FileRole, Project, SourceFile};
use crate::mapper::TypeMapper;
use crate::resolver::{
    call_signature, function_type, member_type, members_of, TypeDecl, TypeResolver, ValueDecl,
};

/// Members that make a callable constant permission-gated.
const PERMISSION_METHODS: &[&str] = &["getPermission", "openPermissionDialog"];

/// The shape a declaration is classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    EventChannel,
    NamespaceObject,
    CallbackBased,
    FreeFunction,
}

/// An exported declaration that may produce APIs.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    Function(&'a DtsFunction),
    Variable(&'a DtsVariable),
}

impl<'a> Candidate<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Candidate::Function(f) => &f.name,
            Candidate::Variable(v) => &v.name,
        }
    }

    pub fn doc(&self) -> Option<&'a JsDoc> {
        match self {
            Candidate::Function(f) => f.doc.as_ref(),
            Candidate::Variable(v) => v.doc.as_ref(),
        }
    }

    pub fn ty(&self) -> DtsType {
        match self {
            Candidate::Function(f) => DtsType::Function(Box::new(function_type(f))),
            Candidate::Variable(v) => v.ty.clone(),
        }
    }

    fn signature(&self, resolver: &dyn TypeResolver) -> Option<FunctionType> {
        match self {
            Candidate::Function(f) => Some(function_type(f)),
            Candidate::Variable(v) => call_signature(resolver, &v.ty),
        }
    }
}

/// A predicate paired with the shape it selects.
pub struct ShapeRule {
    pub shape: Shape,
    pub matches: fn(&Candidate<'_>, &dyn TypeResolver) -> bool,
}

/// Classification rules, evaluated top to bottom; the first match wins.
pub const RULES: &[ShapeRule] = &[
    ShapeRule {
        shape: Shape::EventChannel,
        matches: is_event_channel,
    },
    ShapeRule {
        shape: Shape::NamespaceObject,
        matches: is_namespace_object,
    },
    ShapeRule {
        shape: Shape::CallbackBased,
        matches: is_callback_based,
    },
    ShapeRule {
        shape: Shape::FreeFunction,
        matches: is_free_function,
    },
];

/// The shape of a candidate, or `None` when no rule applies.
pub fn classify(candidate: &Candidate<'_>, resolver: &dyn TypeResolver) -> Option<Shape> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(candidate, resolver))
        .map(|rule| rule.shape)
}

fn has_member(resolver: &dyn TypeResolver, ty: &DtsType, name: &str) -> bool {
    members_of(resolver, ty).is_some_and(|members| members.iter().any(|m| m.name() == Some(name)))
}

fn is_event_channel(candidate: &Candidate<'_>, resolver: &dyn TypeResolver) -> bool {
    match candidate {
        Candidate::Variable(v) => has_member(resolver, &v.ty, "addEventListener"),
        Candidate::Function(_) => false,
    }
}

fn is_namespace_object(candidate: &Candidate<'_>, resolver: &dyn TypeResolver) -> bool {
    let Candidate::Variable(v) = candidate else {
        return false;
    };
    if call_signature(resolver, &v.ty).is_some() {
        return false;
    }
    members_of(resolver, &v.ty).is_some_and(|members| {
        members.iter().any(|m| {
            member_type(m).is_some_and(|ty| call_signature(resolver, &ty).is_some())
        })
    })
}

fn is_callback_based(candidate: &Candidate<'_>, resolver: &dyn TypeResolver) -> bool {
    let Some(signature) = candidate.signature(resolver) else {
        return false;
    };
    let Some(last) = signature.params.last() else {
        return false;
    };
    let Some(members) = members_of(resolver, &last.ty) else {
        return false;
    };
    let callable = |name: &str| {
        members.iter().any(|m| {
            m.name() == Some(name)
                && member_type(m).is_some_and(|ty| call_signature(resolver, &ty).is_some())
        })
    };
    (callable("onSuccess") || callable("onEvent")) && callable("onError")
}

fn is_free_function(candidate: &Candidate<'_>, resolver: &dyn TypeResolver) -> bool {
    match candidate {
        Candidate::Function(_) => true,
        Candidate::Variable(v) => {
            call_signature(resolver, &v.ty).is_some()
                && !has_member(resolver, &v.ty, "addEventListener")
        }
    }
}

/// Exported candidates of a file in declaration order. Overloaded
/// functions keep their position and their last declaration.
fn candidates(file: &SourceFile) -> Vec<Candidate<'_>> {
    let mut listed: HashSet<&str> = HashSet::new();
    for item in &file.ast.items {
        if let DtsItem::Export(DtsExport::Named { names, from: None }) = item {
            listed.extend(names.iter().map(|(name, _)| name.as_str()));
        }
    }

    fn walk<'a>(
        items: &'a [DtsItem],
        file: &SourceFile,
        listed: &HashSet<&str>,
        out: &mut IndexMap<&'a str, Candidate<'a>>,
    ) {
        for item in items {
            let visible = |name: &str, exported: bool| {
                !file.is_module || exported || listed.contains(name)
            };
            match item {
                DtsItem::Function(f) if visible(&f.name, f.exported) => {
                    out.insert(&f.name, Candidate::Function(f));
                }
                DtsItem::Variable(v) if visible(&v.name, v.exported) => {
                    out.entry(&v.name).or_insert(Candidate::Variable(v));
                }
                DtsItem::Module(module) => walk(&module.items, file, listed, out),
                _ => {}
            }
        }
    }

    let mut found: IndexMap<&str, Candidate<'_>> = IndexMap::new();
    walk(&file.ast.items, file, &listed, &mut found);
    found.into_values().collect()
}

/// Turns a project into APIs.
pub struct Extractor<'r> {
    mapper: TypeMapper<'r>,
    exclude: Vec<String>,
    /// `(category, name)` to the file that first produced it.
    seen: HashMap<(String, String), PathBuf>,
    diagnostics: Diagnostics,
}

impl<'r> Extractor<'r> {
    pub fn new(resolver: &'r dyn TypeResolver, input: &InputConfig) -> Self {
        Extractor {
            mapper: TypeMapper::new(resolver),
            exclude: input.exclude_apis().to_vec(),
            seen: HashMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    fn resolver(&self) -> &'r dyn TypeResolver {
        self.mapper.resolver()
    }

    /// Extracts every file of the project in load order.
    pub fn extract_project(mut self, project: &Project) -> (Vec<ParsedAPI>, Diagnostics) {
        let mut apis = Vec::new();
        for file in &project.files {
            apis.extend(self.extract_file(file));
        }
        info!(apis = apis.len(), "extracted APIs");
        self.report_merged_categories(project);
        let mut diagnostics = self.diagnostics;
        diagnostics.extend(self.mapper.take_diagnostics());
        (apis, diagnostics)
    }

    /// Extracts the APIs declared in one file.
    pub fn extract_file(&mut self, file: &SourceFile) -> Vec<ParsedAPI> {
        if file.role == FileRole::TypesOnly {
            return Vec::new();
        }

        let mut apis = Vec::new();
        for candidate in candidates(file) {
            if candidate.doc().is_some_and(|doc| doc.deprecated) {
                debug!(name = candidate.name(), "skipping deprecated declaration");
                continue;
            }

            let shape = classify(&candidate, self.resolver());
            if file.role == FileRole::Index && shape != Some(Shape::NamespaceObject) {
                continue;
            }

            let produced = match shape {
                Some(Shape::EventChannel) => self.event_channel(file, &candidate),
                Some(Shape::NamespaceObject) => self.namespace_object(file, &candidate),
                Some(Shape::CallbackBased | Shape::FreeFunction) => self.function(file, &candidate),
                None => self.ambiguous(file, &candidate),
            };

            for api in produced {
                if self.is_excluded(&api) {
                    info!(api = %api.name, "excluded by configuration");
                    continue;
                }
                let key = (api.category.clone(), api.name.clone());
                if let Some(first) = self.seen.get(&key) {
                    self.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::DuplicateApi,
                            format!(
                                "`{}` is already declared in {}; this declaration is skipped",
                                api.name,
                                first.display()
                            ),
                        )
                        .with_file(&file.path)
                        .with_api(&api.name),
                    );
                    continue;
                }
                self.seen.insert(key, file.path.clone());
                apis.push(api);
            }
        }
        debug!(file = %file.relative, apis = apis.len(), "extracted file");
        apis
    }

    /// Declaration files that share a stem render into one category.
    fn report_merged_categories(&mut self, project: &Project) {
        let mut sources: IndexMap<&str, Vec<&SourceFile>> = IndexMap::new();
        for file in project.files.iter().filter(|f| f.role != FileRole::TypesOnly) {
            sources.entry(file.category.as_str()).or_default().push(file);
        }
        for (category, files) in sources {
            let [first, rest @ ..] = files.as_slice() else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let others: Vec<&str> = rest.iter().map(|f| f.relative.as_str()).collect();
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::CategoryMerged,
                    format!(
                        "category `{category}` merges {} with {}",
                        first.relative,
                        others.join(", ")
                    ),
                )
                .with_file(&first.path),
            );
        }
    }

    fn is_excluded(&self, api: &ParsedAPI) -> bool {
        self.exclude
            .iter()
            .any(|name| name == &api.name || name == &api.original_name)
    }

    fn function(&mut self, file: &SourceFile, candidate: &Candidate<'_>) -> Vec<ParsedAPI> {
        let name = candidate.name();
        let resolver = self.resolver();
        let Some(signature) = candidate.signature(resolver) else {
            return self.ambiguous(file, candidate);
        };
        let ty = candidate.ty();

        let mut api = self.build_api(file, name, name, &signature, candidate.doc());
        let mut apis = Vec::new();

        if let Some(members) = members_of(resolver, &ty) {
            for method in PERMISSION_METHODS {
                let Some(member) = members.iter().find(|m| m.name() == Some(*method)) else {
                    continue;
                };
                api.has_permission = true;
                let Some(sig) = member_type(member).and_then(|t| call_signature(resolver, &t)) else {
                    continue;
                };
                let sub_name = format!("{name}{}", to_pascal_case(method));
                apis.push(self.build_api(
                    file,
                    &sub_name,
                    &format!("{name}.{method}"),
                    &sig,
                    member.doc(),
                ));
            }
        }

        apis.insert(0, api);
        apis
    }

    fn namespace_object(&mut self, file: &SourceFile, candidate: &Candidate<'_>) -> Vec<ParsedAPI> {
        let namespace = candidate.name();
        let resolver = self.resolver();
        let members = members_of(resolver, &candidate.ty()).unwrap_or_default();

        let mut apis = Vec::new();
        for member in &members {
            let Some(member_name) = member.name() else {
                continue;
            };
            let Some(ty) = member_type(member) else {
                continue;
            };
            let Some(signature) = call_signature(resolver, &ty) else {
                debug!(namespace, member = member_name, "skipping non-function member");
                continue;
            };
            let doc = member.doc().or_else(|| referenced_doc(resolver, &ty));
            if doc.is_some_and(|d| d.deprecated) {
                continue;
            }
            let name = format!("{namespace}{}", to_pascal_case(member_name));
            let mut api = self.build_api(
                file,
                &name,
                &format!("{namespace}.{member_name}"),
                &signature,
                doc,
            );
            api.has_permission = PERMISSION_METHODS.iter().any(|m| has_member(resolver, &ty, m));
            apis.push(api);
        }
        apis
    }

    fn event_channel(&mut self, file: &SourceFile, candidate: &Candidate<'_>) -> Vec<ParsedAPI> {
        let namespace = candidate.name();
        let resolver = self.resolver();
        let listener = members_of(resolver, &candidate.ty())
            .unwrap_or_default()
            .into_iter()
            .find(|m| m.name() == Some("addEventListener"))
            .and_then(|m| member_type(&m))
            .and_then(|ty| call_signature(resolver, &ty));

        let events = listener
            .as_ref()
            .map(|sig| event_names(resolver, sig))
            .unwrap_or_default();

        if events.is_empty() {
            let Some(listener) = listener else {
                return self.ambiguous(file, candidate);
            };
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::ParseAmbiguity,
                    format!(
                        "`{namespace}` exposes addEventListener but no event names could be found; \
                         emitting it as a plain function"
                    ),
                )
                .with_file(&file.path)
                .with_api(namespace),
            );
            return vec![self.build_api(
                file,
                &format!("{namespace}AddEventListener"),
                &format!("{namespace}.addEventListener"),
                &listener,
                candidate.doc(),
            )];
        }

        let doc = candidate.doc();
        events
            .into_iter()
            .map(|(event, data)| {
                let name = format!("{namespace}Subscribe{}", to_pascal_case(&event));
                self.mapper.set_context(Some(&name), Some(&file.path));
                let event_data_type = data
                    .map(|ty| self.mapper.map_type(&ty))
                    .filter(|ty| !ty.is_void());
                ParsedAPI {
                    display_name: to_pascal_case(&name),
                    original_name: format!("{namespace}.addEventListener"),
                    category: file.category.clone(),
                    parameters: Vec::new(),
                    return_type: ParsedType::unsubscribe(),
                    is_async: false,
                    is_callback_based: false,
                    is_event_subscription: true,
                    event_name: Some(event.clone()),
                    event_data_type,
                    has_permission: false,
                    description: Some(
                        doc.map(|d| d.description.clone())
                            .filter(|d| !d.is_empty())
                            .unwrap_or_else(|| format!("Subscribes to the `{event}` event of `{namespace}`.")),
                    ),
                    return_description: Some("Unsubscribes when invoked.".to_string()),
                    examples: Vec::new(),
                    named_callbacks: Vec::new(),
                    source_file: file.path.clone(),
                    name,
                }
            })
            .collect()
    }

    fn ambiguous(&mut self, file: &SourceFile, candidate: &Candidate<'_>) -> Vec<ParsedAPI> {
        let name = candidate.name();
        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::ParseAmbiguity,
                format!("`{name}` matches no known shape; emitting it as a plain function"),
            )
            .with_file(&file.path)
            .with_api(name),
        );
        let signature = FunctionType {
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: Box::new(candidate.ty()),
        };
        vec![self.build_api(file, name, name, &signature, candidate.doc())]
    }

    fn build_api(
        &mut self,
        file: &SourceFile,
        name: &str,
        original_name: &str,
        signature: &FunctionType,
        doc: Option<&JsDoc>,
    ) -> ParsedAPI {
        self.mapper.set_context(Some(name), Some(&file.path));
        let (parameters, return_type) = self.mapper.map_signature(signature, doc);

        let named_callbacks = callback_members(parameters.last().map(|p| &p.ty));
        let is_callback_based = named_callbacks.is_some();
        let is_async = !is_callback_based && return_type.is_promise();

        let description = doc.and_then(|d| {
            let mut text = d.description.clone();
            if let Some(category) = &d.category {
                if !text.is_empty() {
                    text.push_str("\n\n");
                }
                text.push_str(&format!("Category: {category}"));
            }
            (!text.is_empty()).then_some(text)
        });

        ParsedAPI {
            name: name.to_string(),
            display_name: to_pascal_case(name),
            original_name: original_name.to_string(),
            category: file.category.clone(),
            parameters,
            return_type,
            is_async,
            is_callback_based,
            is_event_subscription: false,
            event_name: None,
            event_data_type: None,
            has_permission: false,
            description,
            return_description: doc.and_then(|d| d.returns.clone()).filter(|r| !r.is_empty()),
            examples: doc.map(|d| d.examples.clone()).unwrap_or_default(),
            named_callbacks: named_callbacks.unwrap_or_default(),
            source_file: file.path.clone(),
        }
    }
}

/// Named callbacks of a resolve/reject-carrying object, or `None` when the
/// object does not carry the pair.
fn callback_members(last: Option<&ParsedType>) -> Option<Vec<NamedCallback>> {
    let properties = last?.properties();
    let is_callback = |name: &str| {
        properties
            .iter()
            .any(|p| p.name == name && p.ty.is_function())
    };
    if !((is_callback("onSuccess") || is_callback("onEvent")) && is_callback("onError")) {
        return None;
    }
    Some(
        properties
            .iter()
            .filter(|p| !matches!(p.name.as_str(), "onSuccess" | "onEvent" | "onError"))
            .filter(|p| is_callback_name(&p.name) && p.ty.is_function())
            .map(|p| NamedCallback {
                name: p.name.clone(),
                data_type: match &p.ty.kind {
                    TypeKind::Function { params, .. } => {
                        params.first().map(|param| param.ty.clone()).filter(|t| !t.is_void())
                    }
                    _ => None,
                },
                optional: p.optional,
            })
            .collect(),
    )
}

/// `onPurchased` but not `once` or `online`.
pub fn is_callback_name(name: &str) -> bool {
    name.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Doc comment of the function a `typeof` member points at.
fn referenced_doc<'a>(resolver: &'a dyn TypeResolver, ty: &DtsType) -> Option<&'a JsDoc> {
    let DtsType::TypeOf(path) = ty.unparen() else {
        return None;
    };
    match resolver.resolve_value(path)? {
        ValueDecl::Function(f) => f.doc.as_ref(),
        ValueDecl::Variable(v) => v.doc.as_ref(),
    }
}

/// Event names of an `addEventListener` signature with the declared type of
/// each event's payload.
fn event_names(resolver: &dyn TypeResolver, listener: &FunctionType) -> Vec<(String, Option<DtsType>)> {
    let Some(key) = listener.params.first() else {
        return Vec::new();
    };

    // `K extends keyof EventMap` or a bare `keyof EventMap`.
    let key_ty = match key.ty.unparen() {
        DtsType::Named { name, type_args } if type_args.is_empty() => listener
            .type_params
            .iter()
            .find(|tp| &tp.name == name)
            .and_then(|tp| tp.constraint.clone())
            .unwrap_or_else(|| key.ty.clone()),
        other => other.clone(),
    };

    if let DtsType::KeyOf(map) = key_ty.unparen() {
        let Some(members) = members_of(resolver, map) else {
            return Vec::new();
        };
        return members
            .iter()
            .filter_map(|m| {
                let event = m.name()?.to_string();
                let value = member_type(m)?;
                Some((event, payload_type(resolver, &value)))
            })
            .collect();
    }

    let handler = listener.params.get(1).and_then(|p| payload_type(resolver, &p.ty));
    let mut literals = Vec::new();
    collect_literals(resolver, &key_ty, &mut literals, 0);
    literals
        .into_iter()
        .map(|event| (event, handler.clone()))
        .collect()
}

fn collect_literals(resolver: &dyn TypeResolver, ty: &DtsType, out: &mut Vec<String>, depth: usize) {
    if depth > 8 {
        return;
    }
    match ty.unparen() {
        DtsType::StringLiteral(s) => {
            if !out.contains(s) {
                out.push(s.clone());
            }
        }
        DtsType::Union(members) => {
            for member in members {
                collect_literals(resolver, member, out, depth + 1);
            }
        }
        DtsType::Named { name, .. } => {
            if let Some(TypeDecl::Alias(alias)) = resolver.resolve_type(name) {
                collect_literals(resolver, &alias.ty, out, depth + 1);
            }
        }
        _ => {}
    }
}

/// Payload of an event map entry or handler: the first parameter of its
/// `onEvent` member, of the handler itself, or the entry type.
fn payload_type(resolver: &dyn TypeResolver, value: &DtsType) -> Option<DtsType> {
    if let Some(members) = members_of(resolver, value) {
        if let Some(on_event) = members.iter().find(|m| m.name() == Some("onEvent")) {
            let sig = member_type(on_event).and_then(|t| call_signature(resolver, &t))?;
            return sig.params.first().map(|p| p.ty.clone());
        }
    }
    if let Some(sig) = call_signature(resolver, value) {
        return sig.params.first().map(|p| p.ty.clone());
    }
    match value.unparen() {
        DtsType::Primitive(Primitive::Void | Primitive::Undefined) => None,
        other => Some(other.clone()),
    }
}

/// Convenience entry point: extracts every API of a loaded project.
pub fn extract(
    project: &Project,
    resolver: &dyn TypeResolver,
    input: &InputConfig,
) -> (Vec<ParsedAPI>, Diagnostics) {
    Extractor::new(resolver, input).extract_project(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ProjectResolver;

    fn run(files: &[(&str, &str)]) -> (Vec<ParsedAPI>, Diagnostics) {
        run_with(files, &InputConfig::default())
    }

    fn run_with(files: &[(&str, &str)], input: &InputConfig) -> (Vec<ParsedAPI>, Diagnostics) {
        let (project, _) = Project::from_sources(files.iter().copied());
        let resolver = ProjectResolver::new(&project);
        extract(&project, &resolver, input)
    }

    fn names(apis: &[ParsedAPI]) -> Vec<&str> {
        apis.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn same_stem_files_merge_and_drop_repeated_names() {
        let (apis, diags) = run(&[
            (
                "sdk/storage.d.ts",
                "export declare function getItem(key: string): Promise<string | null>;\n\
                 export declare function clearItems(): Promise<void>;",
            ),
            (
                "legacy/storage.d.ts",
                "export declare function setItem(key: string, value: string): Promise<void>;\n\
                 export declare function getItem(key: string): string;",
            ),
        ]);
        assert_eq!(names(&apis), ["getItem", "clearItems", "setItem"]);
        assert!(apis.iter().all(|a| a.category == "storage"));
        assert!(apis[0].is_async, "the first declaration wins");

        assert_eq!(diags.count(DiagnosticKind::DuplicateApi), 1);
        assert_eq!(diags.count(DiagnosticKind::CategoryMerged), 1);
        let duplicate = diags
            .iter()
            .find(|d| d.kind == DiagnosticKind::DuplicateApi)
            .unwrap();
        assert_eq!(duplicate.api.as_deref(), Some("getItem"));
        assert_eq!(duplicate.file.as_deref(), Some(std::path::Path::new("legacy/storage.d.ts")));
        assert!(duplicate.message.contains("sdk/storage.d.ts"));
        let merged = diags
            .iter()
            .find(|d| d.kind == DiagnosticKind::CategoryMerged)
            .unwrap();
        assert_eq!(merged.severity, crate::diagnostics::Severity::Info);
        assert!(merged.message.contains("legacy/storage.d.ts"));
    }

    #[test]
    fn namespace_object_round_trip() {
        let (apis, diags) = run(&[(
            "widgets.d.ts",
            "export declare const fooNamespace: { foo: (x: number) => string; bar: () => Promise<boolean> };",
        )]);
        assert!(diags.is_empty());
        assert_eq!(names(&apis), ["fooNamespaceFoo", "fooNamespaceBar"]);
        assert!(apis.iter().all(|a| a.category == "widgets"));

        let foo = &apis[0];
        assert!(!foo.is_async);
        assert!(foo.return_type.is_primitive("string"));
        assert_eq!(foo.original_name, "fooNamespace.foo");

        let bar = &apis[1];
        assert!(bar.is_async);
        match &bar.return_type.kind {
            TypeKind::Promise { inner } => assert!(inner.is_primitive("boolean")),
            other => panic!("expected promise, got {other:?}"),
        }
    }

    #[test]
    fn free_functions_are_async_when_returning_promises() {
        let (apis, _) = run(&[(
            "device.d.ts",
            "export declare function getLocale(): string;\n\
             export declare function getNetworkStatus(): Promise<'WIFI' | 'LTE'>;",
        )]);
        assert!(!apis[0].is_async);
        assert!(apis[1].is_async);
        assert_eq!(apis[1].display_name, "GetNetworkStatus");
    }

    #[test]
    fn event_channels_yield_one_api_per_event() {
        let (apis, _) = run(&[(
            "events.d.ts",
            "export type GraniteEvent = {\n\
               backEvent: { onEvent: () => void; onError?: (e: Error) => void };\n\
               visibilityChange: { onEvent: (visible: boolean) => void };\n\
             };\n\
             export declare const graniteEvent: {\n\
               addEventListener<K extends keyof GraniteEvent>(event: K, handler: GraniteEvent[K]): () => void;\n\
             };",
        )]);
        assert_eq!(
            names(&apis),
            ["graniteEventSubscribeBackEvent", "graniteEventSubscribeVisibilityChange"]
        );
        assert!(apis.iter().all(|a| a.is_event_subscription && !a.is_async));
        assert!(apis[0].event_data_type.is_none());
        assert!(apis[1]
            .event_data_type
            .as_ref()
            .is_some_and(|t| t.is_primitive("boolean")));
        assert_eq!(apis[1].event_name.as_deref(), Some("visibilityChange"));
        assert!(apis[0].return_type.is_function());
    }

    #[test]
    fn event_channel_with_literal_keys() {
        let (apis, _) = run(&[(
            "app.d.ts",
            "export declare const appEvents: {\n\
               addEventListener(event: 'pause' | 'resume', handler: { onEvent: () => void }): () => void;\n\
             };",
        )]);
        assert_eq!(names(&apis), ["appEventsSubscribePause", "appEventsSubscribeResume"]);
    }

    #[test]
    fn event_channel_without_event_names_falls_back_to_a_function() {
        let (apis, diags) = run(&[(
            "ev.d.ts",
            "export declare const ev: {\n\
               addEventListener(e: string, h: { onEvent: () => void }): () => void;\n\
             };",
        )]);
        assert_eq!(names(&apis), ["evAddEventListener"]);
        let api = &apis[0];
        assert!(!api.is_event_subscription);
        assert_eq!(api.original_name, "ev.addEventListener");
        assert_eq!(api.parameters.len(), 2);
        assert_eq!(diags.count(DiagnosticKind::ParseAmbiguity), 1);
    }

    #[test]
    fn callback_based_functions_collect_named_callbacks() {
        let (apis, _) = run(&[(
            "ads.d.ts",
            "export declare function loadAd(args: {\n\
               adUnitId: string;\n\
               onEvent: (e: { type: string }) => void;\n\
               onError: (err: Error) => void;\n\
               onLoaded?: (info: { id: string }) => void;\n\
               onClosed?: () => void;\n\
             }): () => void;",
        )]);
        let api = &apis[0];
        assert!(api.is_callback_based);
        assert!(!api.is_async);
        let callbacks: Vec<_> = api.named_callbacks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(callbacks, ["onLoaded", "onClosed"]);
        assert!(api.named_callbacks[0].data_type.is_some());
        assert!(api.named_callbacks[1].data_type.is_none());
    }

    #[test]
    fn callback_pair_without_extras_is_callback_based() {
        let (apis, _) = run(&[(
            "location.d.ts",
            "export declare function startUpdateLocation(p: {\n\
               onEvent: (loc: { lat: number }) => void; onError: (e: Error) => void;\n\
             }): () => void;",
        )]);
        assert!(apis[0].is_callback_based);
        assert!(apis[0].named_callbacks.is_empty());
    }

    #[test]
    fn permission_functions_expose_sub_methods() {
        let (apis, _) = run(&[(
            "clipboard.d.ts",
            "type PermissionFunctionWithDialog<F> = F & {\n\
               getPermission(): Promise<'allowed' | 'denied'>;\n\
               openPermissionDialog(): Promise<'allowed' | 'denied'>;\n\
             };\n\
             export declare const getClipboardText: PermissionFunctionWithDialog<() => Promise<string>>;",
        )]);
        assert_eq!(
            names(&apis),
            [
                "getClipboardText",
                "getClipboardTextGetPermission",
                "getClipboardTextOpenPermissionDialog"
            ]
        );
        assert!(apis[0].has_permission);
        assert!(apis[0].is_async);
        assert_eq!(apis[1].original_name, "getClipboardText.getPermission");
    }

    #[test]
    fn unclassifiable_constants_fall_back_with_diagnostic() {
        let (apis, diags) = run(&[("env.d.ts", "export declare const SDK_VERSION: string;")]);
        assert_eq!(names(&apis), ["SDK_VERSION"]);
        assert!(apis[0].parameters.is_empty());
        assert_eq!(diags.count(DiagnosticKind::ParseAmbiguity), 1);
    }

    #[test]
    fn exclusions_and_deprecation() {
        let input = InputConfig {
            exclude_apis: Some(vec!["hidden".to_string()]),
            ..InputConfig::default()
        };
        let (apis, _) = run_with(
            &[(
                "misc.d.ts",
                "export declare function hidden(): void;\n\
                 /** @deprecated */\n\
                 export declare function old(): void;\n\
                 export declare function kept(): void;\n\
                 declare function internal(): void;\n\
                 export * from './other';",
            )],
            &input,
        );
        assert_eq!(names(&apis), ["kept"]);
    }

    #[test]
    fn overloads_keep_the_last_declaration() {
        let (apis, _) = run(&[(
            "share.d.ts",
            "export declare function share(text: string): void;\n\
             export declare function share(options: { text: string; url?: string }): Promise<void>;",
        )]);
        assert_eq!(apis.len(), 1);
        assert!(apis[0].is_async);
        assert_eq!(apis[0].parameters[0].name, "options");
    }

    #[test]
    fn index_files_only_contribute_namespaces() {
        let (apis, _) = run(&[(
            "index.d.ts",
            "export declare function notHere(): void;\n\
             export declare const Storage: { getItem(key: string): Promise<string | null> };",
        )]);
        assert_eq!(names(&apis), ["StorageGetItem"]);
        assert_eq!(apis[0].category, "index");
    }

    #[test]
    fn script_files_export_everything() {
        let (apis, _) = run(&[("globals.d.ts", "declare function closeView(): void;")]);
        assert_eq!(names(&apis), ["closeView"]);
    }

    #[test]
    fn classification_is_idempotent() {
        let files = [(
            "media.d.ts",
            "export declare function openCamera(options?: { base64?: boolean }): Promise<{ id: string }>;",
        )];
        assert_eq!(run(&files).0, run(&files).0);
    }

    #[test]
    fn callback_names() {
        assert!(is_callback_name("onPurchased"));
        assert!(!is_callback_name("online"));
        assert!(!is_callback_name("on"));
    }
}
