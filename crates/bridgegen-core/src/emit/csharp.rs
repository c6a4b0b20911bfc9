//! Native stub (C#) rendering.

use indexmap::IndexMap;
use serde::Serialize;

use super::naming::{
    csharp_default, csharp_param_name, enum_member_name, result_class_name, synthetic_name,
    to_pascal_case,
};
use super::templates;
use crate::config::OutputConfig;
use crate::error::EmitError;
use crate::ir::{
    DefinitionKind, EnumValue, ParsedAPI, ParsedParameter, ParsedProperty, ParsedType,
    ParsedTypeDefinition, TypeKind,
};

const INDENT: &str = "        ";

/// A generated C# class.
#[derive(Debug, Clone, Serialize)]
pub struct CsClass {
    pub name: String,
    pub doc: String,
    pub fields: Vec<CsField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CsField {
    pub json_name: String,
    pub name: String,
    pub ty: String,
    pub doc: String,
}

/// A generated C# enum.
#[derive(Debug, Clone, Serialize)]
pub struct CsEnum {
    pub name: String,
    pub doc: String,
    pub numeric: bool,
    pub members: Vec<CsEnumMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CsEnumMember {
    pub name: String,
    /// Escaped string literal body, or the integer for numeric enums.
    pub value: String,
}

/// Registry of the classes and enums the generated code refers to, in
/// first-registration order. The first registration of a name wins.
#[derive(Debug, Default)]
pub struct CsTypes {
    classes: IndexMap<String, CsClass>,
    enums: IndexMap<String, CsEnum>,
}

impl CsTypes {
    /// A registry seeded with the collected type definitions.
    pub fn with_definitions(definitions: &IndexMap<String, ParsedTypeDefinition>) -> Self {
        let mut types = CsTypes::default();
        for definition in definitions.values() {
            let name = to_pascal_case(&definition.name);
            let doc = doc_comment("    ", definition.description.as_deref(), &[], None, &[]);
            match &definition.kind {
                DefinitionKind::Enum { values } => types.register_enum(&name, values, doc),
                DefinitionKind::Interface { properties } => {
                    types.register_class(&name, properties, doc);
                }
            }
        }
        types
    }

    pub fn classes(&self) -> impl Iterator<Item = &CsClass> {
        self.classes.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &CsEnum> {
        self.enums.values()
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    /// C# type for `ty`; anonymous shapes are registered under `hint`.
    pub fn cs_type(&mut self, ty: &ParsedType, hint: &str) -> String {
        match &ty.kind {
            TypeKind::Primitive => match ty.name.as_str() {
                "string" => "string",
                "number" => "double",
                "boolean" => "bool",
                "void" => "void",
                _ => "object",
            }
            .to_string(),
            TypeKind::Object { properties } => {
                if ty.is_any() || (properties.is_empty() && ty.name.is_empty()) {
                    return "object".to_string();
                }
                let name = if ty.name.is_empty() {
                    hint.to_string()
                } else {
                    to_pascal_case(&ty.name)
                };
                self.register_class(&name, properties, String::new());
                name
            }
            TypeKind::Array { element } => {
                format!("{}[]", self.cs_type(element, &format!("{hint}Item")))
            }
            TypeKind::Function { .. } => "object".to_string(),
            TypeKind::Promise { inner } => self.cs_type(inner, hint),
            TypeKind::Union {
                discriminant: Some(discriminant),
                ..
            } => {
                let name = if ty.name.is_empty() {
                    hint.to_string()
                } else {
                    to_pascal_case(&ty.name)
                };
                if !self.classes.contains_key(&name) {
                    let mut properties = vec![ParsedProperty {
                        name: discriminant.tag_field.clone(),
                        ty: ParsedType::primitive("string"),
                        optional: true,
                        description: Some("Active variant.".to_string()),
                    }];
                    for variant in &discriminant.variants {
                        for property in &variant.properties {
                            if !properties.iter().any(|p| p.name == property.name) {
                                properties.push(ParsedProperty {
                                    optional: true,
                                    ..property.clone()
                                });
                            }
                        }
                    }
                    self.register_class(&name, &properties, String::new());
                }
                name
            }
            TypeKind::Union {
                members,
                discriminant: None,
            } => {
                if ty.name.is_empty() {
                    return "string".to_string();
                }
                let name = to_pascal_case(&ty.name);
                if !self.enums.contains_key(&name) {
                    let values: Vec<EnumValue> = members
                        .iter()
                        .filter_map(|m| {
                            let (value, numeric) = match m.literal_value() {
                                Some(literal) => (literal.to_string(), false),
                                None if m.is_primitive("number") => (m.raw.clone(), true),
                                None => return None,
                            };
                            Some(EnumValue {
                                name: value.clone(),
                                value,
                                numeric,
                            })
                        })
                        .collect();
                    if values.is_empty() {
                        return "string".to_string();
                    }
                    self.register_enum(&name, &values, String::new());
                }
                name
            }
        }
    }

    /// `ty` made nullable when it is a value type.
    fn nullable(&self, cs: String) -> String {
        if matches!(cs.as_str(), "double" | "bool") || self.is_enum(&cs) {
            format!("{cs}?")
        } else {
            cs
        }
    }

    fn register_class(&mut self, name: &str, properties: &[ParsedProperty], doc: String) {
        if self.classes.contains_key(name) {
            return;
        }
        // Reserve the slot first so self-references terminate.
        self.classes.insert(
            name.to_string(),
            CsClass {
                name: name.to_string(),
                doc,
                fields: Vec::new(),
            },
        );

        let mut fields: Vec<CsField> = Vec::new();
        for property in properties {
            let mut field_name = to_pascal_case(&property.name);
            if field_name.is_empty() {
                field_name = "Value".to_string();
            }
            if field_name == name {
                field_name.push_str("Value");
            }
            let base = field_name.clone();
            let mut suffix = 2;
            while fields.iter().any(|f| f.name == field_name) {
                field_name = format!("{base}{suffix}");
                suffix += 1;
            }

            let mut cs = self.cs_type(&property.ty, &synthetic_name(name, &property.name));
            if cs == "void" {
                cs = "object".to_string();
            }
            if property.optional {
                cs = self.nullable(cs);
            }
            fields.push(CsField {
                json_name: escape_string(&property.name),
                name: field_name,
                ty: cs,
                doc: doc_comment(INDENT, property.description.as_deref(), &[], None, &[]),
            });
        }
        if let Some(class) = self.classes.get_mut(name) {
            class.fields = fields;
        }
    }

    fn register_enum(&mut self, name: &str, values: &[EnumValue], doc: String) {
        if self.enums.contains_key(name) {
            return;
        }
        let numeric = values
            .iter()
            .all(|v| v.numeric && v.value.parse::<i64>().is_ok());
        let mut members: Vec<CsEnumMember> = Vec::new();
        for value in values {
            let base = if numeric && value.name == value.value {
                format!("Value{}", value.value.replace('-', "Minus"))
            } else {
                enum_member_name(&value.name)
            };
            let mut member = base.clone();
            let mut suffix = 2;
            while members.iter().any(|m| m.name == member) {
                member = format!("{base}{suffix}");
                suffix += 1;
            }
            members.push(CsEnumMember {
                name: member,
                value: if numeric {
                    value.value.clone()
                } else {
                    escape_string(&value.value)
                },
            });
        }
        self.enums.insert(
            name.to_string(),
            CsEnum {
                name: name.to_string(),
                doc,
                numeric,
                members,
            },
        );
    }
}

/// Escapes text for a C# or JavaScript double-quoted string literal.
pub(crate) fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// An XML doc comment block, one `///` line per row, each ending in a
/// newline. Empty when there is nothing to document.
fn doc_comment(
    indent: &str,
    summary: Option<&str>,
    params: &[(String, String)],
    returns: Option<&str>,
    examples: &[String],
) -> String {
    let mut lines = Vec::new();
    if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
        lines.push("<summary>".to_string());
        lines.extend(summary.lines().map(xml_escape));
        lines.push("</summary>".to_string());
    }
    for (name, text) in params {
        lines.push(format!("<param name=\"{name}\">{}</param>", xml_escape(text)));
    }
    if let Some(returns) = returns.filter(|r| !r.trim().is_empty()) {
        lines.push(format!("<returns>{}</returns>", xml_escape(returns)));
    }
    for example in examples {
        lines.push("<example><code>".to_string());
        lines.extend(example.lines().map(xml_escape));
        lines.push("</code></example>".to_string());
    }
    lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                format!("{indent}///\n")
            } else {
                format!("{indent}/// {line}\n")
            }
        })
        .collect()
}

/// How a parameter crosses the native boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Transport {
    Str,
    Num,
    Bool,
    Json,
}

impl Transport {
    /// Required primitives cross natively; everything else as JSON text.
    pub(crate) fn of(ty: &ParsedType, optional: bool) -> Self {
        if optional {
            return Transport::Json;
        }
        match (&ty.kind, ty.name.as_str()) {
            (TypeKind::Primitive, "string") => Transport::Str,
            (TypeKind::Primitive, "number") => Transport::Num,
            (TypeKind::Primitive, "boolean") => Transport::Bool,
            _ => Transport::Json,
        }
    }
}

struct CsParam {
    name: String,
    ty: String,
    optional: bool,
    transport: Transport,
}

impl CsParam {
    fn declaration(&self) -> String {
        if self.optional {
            format!("{} {} = null", self.ty, self.name)
        } else {
            format!("{} {}", self.ty, self.name)
        }
    }

    fn extern_declaration(&self) -> String {
        match self.transport {
            Transport::Str => format!("string {}", self.name),
            Transport::Num => format!("double {}", self.name),
            Transport::Bool => format!("bool {}", self.name),
            Transport::Json => format!("string {}Json", self.name.trim_start_matches('@')),
        }
    }

    fn argument(&self) -> String {
        match self.transport {
            Transport::Json => format!("AITJsonSettings.Serialize({})", self.name),
            _ => self.name.clone(),
        }
    }
}

/// A subscription registered by a callback-based or event method.
#[derive(Debug, Serialize)]
struct Registration {
    id: String,
    expr: String,
}

#[derive(Debug, Serialize)]
struct MethodView {
    kind: &'static str,
    name: String,
    display_name: String,
    category: String,
    doc: String,
    signature: String,
    extern_return: String,
    extern_params: String,
    call_args: String,
    result_type: String,
    is_void: bool,
    result_expr: String,
    default_value: String,
    registrations: Vec<Registration>,
}

struct MethodBuilder<'t> {
    types: &'t mut CsTypes,
}

impl MethodBuilder<'_> {
    fn params(&mut self, api: &ParsedAPI, params: &[ParsedParameter]) -> Vec<CsParam> {
        params
            .iter()
            .map(|param| {
                let mut ty = self
                    .types
                    .cs_type(&param.ty, &synthetic_name(&api.display_name, &param.name));
                if ty == "void" {
                    ty = "object".to_string();
                }
                if param.optional {
                    ty = self.types.nullable(ty);
                }
                CsParam {
                    name: csharp_param_name(&param.name),
                    ty,
                    optional: param.optional,
                    transport: Transport::of(&param.ty, param.optional),
                }
            })
            .collect()
    }

    fn build(&mut self, api: &ParsedAPI) -> MethodView {
        let doc_params: Vec<(String, String)> = api
            .parameters
            .iter()
            .filter_map(|p| {
                p.description
                    .as_ref()
                    .map(|d| (csharp_param_name(&p.name), d.clone()))
            })
            .collect();
        let doc = doc_comment(
            INDENT,
            api.description.as_deref(),
            &doc_params,
            api.return_description.as_deref(),
            &api.examples,
        );

        let mut view = MethodView {
            kind: "sync",
            name: api.name.clone(),
            display_name: api.display_name.clone(),
            category: escape_string(&api.category),
            doc,
            signature: String::new(),
            extern_return: "void".to_string(),
            extern_params: String::new(),
            call_args: String::new(),
            result_type: "void".to_string(),
            is_void: true,
            result_expr: String::new(),
            default_value: String::new(),
            registrations: Vec::new(),
        };

        if api.is_event_subscription {
            self.event(api, &mut view);
        } else if api.is_callback_based {
            self.callback(api, &mut view);
        } else if api.is_async {
            self.asynchronous(api, &mut view);
        } else {
            self.synchronous(api, &mut view);
        }
        view
    }

    fn signature(params: &[CsParam]) -> String {
        let required = params.iter().filter(|p| !p.optional);
        let optional = params.iter().filter(|p| p.optional);
        required
            .chain(optional)
            .map(CsParam::declaration)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn asynchronous(&mut self, api: &ParsedAPI, view: &mut MethodView) {
        let params = self.params(api, &api.parameters);
        view.kind = "async";
        view.signature = Self::signature(&params);
        let mut externs: Vec<String> = params.iter().map(CsParam::extern_declaration).collect();
        externs.push("string callbackId".to_string());
        view.extern_params = externs.join(", ");
        let mut args: Vec<String> = params.iter().map(CsParam::argument).collect();
        args.push("callbackId".to_string());
        view.call_args = args.join(", ");

        if let Some(resolved) = api.resolved_type() {
            let ty = self
                .types
                .cs_type(resolved, &result_class_name(&api.display_name));
            view.default_value = csharp_default(resolved, &ty);
            view.is_void = ty == "void";
            view.result_type = ty;
        }
    }

    fn synchronous(&mut self, api: &ParsedAPI, view: &mut MethodView) {
        let params = self.params(api, &api.parameters);
        view.signature = Self::signature(&params);
        view.extern_params = params
            .iter()
            .map(CsParam::extern_declaration)
            .collect::<Vec<_>>()
            .join(", ");
        view.call_args = params
            .iter()
            .map(CsParam::argument)
            .collect::<Vec<_>>()
            .join(", ");

        let ty = self
            .types
            .cs_type(&api.return_type, &result_class_name(&api.display_name));
        let call = format!("__{}_Internal({})", api.name, view.call_args);
        view.default_value = csharp_default(&api.return_type, &ty);
        view.is_void = ty == "void";
        (view.extern_return, view.result_expr) = match ty.as_str() {
            "void" => ("void".to_string(), String::new()),
            "string" => ("string".to_string(), call),
            "double" => ("double".to_string(), call),
            "bool" => ("int".to_string(), format!("{call} != 0")),
            other => (
                "string".to_string(),
                format!("AITJsonSettings.Deserialize<{other}>({call})"),
            ),
        };
        view.result_type = ty;
    }

    fn callback(&mut self, api: &ParsedAPI, view: &mut MethodView) {
        view.kind = "callback";
        view.result_type = "System.Action".to_string();
        view.is_void = false;

        let (leading, last) = match api.parameters.split_last() {
            Some((last, leading)) => (leading, Some(last)),
            None => (&api.parameters[..], None),
        };
        let mut params = self.params(api, leading);

        let callbacks: Vec<&ParsedProperty> = last
            .map(|p| p.ty.properties().iter().filter(|prop| prop.ty.is_function()).collect())
            .unwrap_or_default();
        let data: Vec<ParsedProperty> = last
            .map(|p| {
                p.ty.properties()
                    .iter()
                    .filter(|prop| !prop.ty.is_function())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(last) = last.filter(|_| !data.is_empty()) {
            let name = synthetic_name(&api.display_name, &last.name);
            self.types.register_class(&name, &data, String::new());
            params.push(CsParam {
                name: csharp_param_name(&last.name),
                ty: name,
                optional: false,
                transport: Transport::Json,
            });
        }
        let data_params = params.len();

        let primary = callbacks
            .iter()
            .find(|c| c.name == "onSuccess")
            .or_else(|| callbacks.iter().find(|c| c.name == "onEvent"))
            .map(|c| c.name.as_str())
            .unwrap_or("onEvent");

        // Resolve/reject pair first.
        let primary_payload = callbacks
            .iter()
            .find(|c| c.name == primary)
            .and_then(|c| first_param(&c.ty));
        let (action, registration) = self.subscription(api, primary, primary_payload, "onError");
        params.push(CsParam {
            name: primary.to_string(),
            ty: action,
            optional: false,
            transport: Transport::Str,
        });
        params.push(CsParam {
            name: "onError".to_string(),
            ty: "System.Action<AITException>".to_string(),
            optional: true,
            transport: Transport::Str,
        });
        view.registrations.push(Registration {
            id: "subscriptionId".to_string(),
            expr: registration,
        });

        for callback in &api.named_callbacks {
            let (action, registration) =
                self.subscription(api, &callback.name, callback.data_type.as_ref(), "null");
            let id = format!("{}Id", callback.name);
            params.push(CsParam {
                name: callback.name.clone(),
                ty: action,
                optional: true,
                transport: Transport::Str,
            });
            view.registrations.push(Registration {
                expr: format!("{} != null ? {registration} : \"\"", callback.name),
                id,
            });
        }

        view.signature = Self::signature(&params);
        let mut externs: Vec<String> = params[..data_params]
            .iter()
            .map(CsParam::extern_declaration)
            .collect();
        let mut args: Vec<String> = params[..data_params].iter().map(CsParam::argument).collect();
        for registration in &view.registrations {
            externs.push(format!("string {}", registration.id));
            args.push(registration.id.clone());
        }
        view.extern_params = externs.join(", ");
        view.call_args = args.join(", ");
    }

    fn event(&mut self, api: &ParsedAPI, view: &mut MethodView) {
        view.kind = "event";
        view.result_type = "System.Action".to_string();
        view.is_void = false;

        let (action, registration) =
            self.subscription(api, "onEvent", api.event_data_type.as_ref(), "onError");
        let params = [
            CsParam {
                name: "onEvent".to_string(),
                ty: action,
                optional: false,
                transport: Transport::Str,
            },
            CsParam {
                name: "onError".to_string(),
                ty: "System.Action<AITException>".to_string(),
                optional: true,
                transport: Transport::Str,
            },
        ];
        view.signature = Self::signature(&params);
        view.extern_params = "string subscriptionId".to_string();
        view.call_args = "subscriptionId".to_string();
        view.registrations.push(Registration {
            id: "subscriptionId".to_string(),
            expr: registration,
        });
    }

    /// The action type of a callback and the expression registering it.
    fn subscription(
        &mut self,
        api: &ParsedAPI,
        callback: &str,
        payload: Option<&ParsedType>,
        on_error: &str,
    ) -> (String, String) {
        let payload = payload.filter(|ty| !ty.is_void());
        match payload {
            Some(ty) => {
                let hint = if api.is_event_subscription {
                    format!("{}Data", api.display_name)
                } else {
                    format!("{}Data", synthetic_name(&api.display_name, callback))
                };
                let cs = self.types.cs_type(ty, &hint);
                (
                    format!("System.Action<{cs}>"),
                    format!("AITCore.Instance.RegisterSubscription<{cs}>({callback}, {on_error})"),
                )
            }
            None => (
                "System.Action".to_string(),
                format!("AITCore.Instance.RegisterVoidSubscription({callback}, {on_error})"),
            ),
        }
    }
}

fn first_param(ty: &ParsedType) -> Option<&ParsedType> {
    match &ty.kind {
        TypeKind::Function { params, .. } => params.first().map(|p| &p.ty),
        _ => None,
    }
}

#[derive(Serialize)]
struct FileView<'a> {
    namespace: &'a str,
    class_name: &'a str,
    sdk_tag: &'a str,
}

impl<'a> FileView<'a> {
    fn new(output: &'a OutputConfig) -> Self {
        FileView {
            namespace: output.namespace(),
            class_name: output.class_name(),
            sdk_tag: output.sdk_tag(),
        }
    }
}

pub(crate) fn render_main(output: &OutputConfig, api_count: usize) -> Result<String, EmitError> {
    #[derive(Serialize)]
    struct View<'a> {
        #[serde(flatten)]
        file: FileView<'a>,
        api_count: usize,
    }
    templates::render(
        "csharp/main.cs",
        &View {
            file: FileView::new(output),
            api_count,
        },
    )
}

pub(crate) fn render_core(output: &OutputConfig) -> Result<String, EmitError> {
    templates::render("csharp/core.cs", &FileView::new(output))
}

pub(crate) fn render_category(
    output: &OutputConfig,
    category: &str,
    apis: &[ParsedAPI],
    types: &mut CsTypes,
) -> Result<String, EmitError> {
    #[derive(Serialize)]
    struct View<'a> {
        #[serde(flatten)]
        file: FileView<'a>,
        category: &'a str,
        methods: Vec<String>,
    }

    let mut builder = MethodBuilder { types };
    let methods = apis
        .iter()
        .map(|api| templates::render("csharp/method.cs", &builder.build(api)))
        .collect::<Result<Vec<_>, _>>()?;
    templates::render(
        "csharp/category.cs",
        &View {
            file: FileView::new(output),
            category,
            methods,
        },
    )
}

pub(crate) fn render_types(output: &OutputConfig, types: &CsTypes) -> Result<String, EmitError> {
    #[derive(Serialize)]
    struct View<'a> {
        #[serde(flatten)]
        file: FileView<'a>,
        enums: Vec<&'a CsEnum>,
        classes: Vec<&'a CsClass>,
    }
    templates::render(
        "csharp/types.cs",
        &View {
            file: FileView::new(output),
            enums: types.enums().collect(),
            classes: types.classes().collect(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::render_sources;

    #[test]
    fn namespace_members_render_sync_and_async_methods() {
        let files = render_sources(&[(
            "widgets.d.ts",
            "export declare const fooNamespace: { foo: (x: number) => string; bar: () => Promise<boolean> };",
        )]);
        let cs = &files["AIT.Widgets.cs"];
        assert!(cs.contains("public static string FooNamespaceFoo(double x)"));
        assert!(cs.contains("private static extern string __fooNamespaceFoo_Internal(double x);"));
        assert!(cs.contains("public static async Task<bool> FooNamespaceBar()"));
        assert!(cs.contains("RegisterCallback<bool>("));
        assert!(cs.contains("[APICategory(\"widgets\")]"));
        assert!(cs.contains("[DllImport(\"__Internal\")]"));
    }

    #[test]
    fn object_parameters_cross_as_json() {
        let files = render_sources(&[(
            "storage.d.ts",
            "export declare function saveBase64Data(params: { data: string; fileName: string; mimeType?: string }): Promise<void>;",
        )]);
        let cs = &files["AIT.Storage.cs"];
        assert!(cs.contains("public static async Task SaveBase64Data(SaveBase64DataParams @params)"));
        assert!(cs.contains("AITJsonSettings.Serialize(@params)"));
        assert!(cs.contains("string paramsJson"));
        let types = &files["AIT.Types.cs"];
        assert!(types.contains("public class SaveBase64DataParams"));
        assert!(types.contains("[JsonProperty(\"mimeType\")]"));
    }

    #[test]
    fn optional_parameters_move_last() {
        let files = render_sources(&[(
            "share.d.ts",
            "export declare function share(title: string | undefined, url: string, count?: number): void;",
        )]);
        assert!(files["AIT.Share.cs"].contains("public static void Share(string url, string title = null, double? count = null)"));
    }

    #[test]
    fn callback_based_methods_register_each_named_callback() {
        let files = render_sources(&[(
            "ads.d.ts",
            "export declare function loadAd(args: {\n\
               adUnitId: string;\n\
               onEvent: (e: { type: string }) => void;\n\
               onError: (err: Error) => void;\n\
               onLoaded?: (info: { id: string }) => void;\n\
               onClosed?: () => void;\n\
             }): () => void;",
        )]);
        let cs = &files["AIT.Ads.cs"];
        assert!(cs.contains("public static System.Action LoadAd(LoadAdArgs args, System.Action<LoadAdOnEventData> onEvent,"));
        assert!(cs.contains("RegisterSubscription<LoadAdOnLoadedData>(onLoaded, null)"));
        assert!(cs.contains("RegisterVoidSubscription(onClosed, null)"));
        assert!(cs.contains("string onLoadedId"));
        assert!(cs.contains("AITCore.Instance.Unsubscribe(onClosedId);"));
    }

    #[test]
    fn event_subscriptions_return_unsubscribe_actions() {
        let files = render_sources(&[(
            "events.d.ts",
            "type GraniteEvent = { backEvent: { onEvent: () => void } };\n\
             export declare const graniteEvent: {\n\
               addEventListener<K extends keyof GraniteEvent>(event: K, handler: GraniteEvent[K]): () => void;\n\
             };",
        )]);
        let cs = &files["AIT.Events.cs"];
        assert!(cs.contains(
            "public static System.Action GraniteEventSubscribeBackEvent(System.Action onEvent, System.Action<AITException> onError = null)"
        ));
        assert!(cs.contains("RegisterVoidSubscription(onEvent, onError)"));
    }

    #[test]
    fn discriminated_results_become_result_classes() {
        let files = render_sources(&[(
            "payment.d.ts",
            "export declare function checkoutPayment(o: { orderId: string }): Promise<{ success: true; paymentKey: string } | 'USER_CANCELED' | 'FAILED'>;",
        )]);
        assert!(files["AIT.Payment.cs"].contains("Task<CheckoutPaymentResult>"));
        let types = &files["AIT.Types.cs"];
        assert!(types.contains("public class CheckoutPaymentResult"));
        assert!(types.contains("[JsonProperty(\"_type\")]"));
        assert!(types.contains("public string PaymentKey;"));
    }

    #[test]
    fn named_literal_unions_become_enums() {
        let files = render_sources(&[(
            "network.d.ts",
            "export type NetworkStatus = 'WIFI' | '4G' | 'OFFLINE';\n\
             export declare function getNetworkStatus(): Promise<NetworkStatus>;",
        )]);
        let types = &files["AIT.Types.cs"];
        assert!(types.contains("public enum NetworkStatus"));
        assert!(types.contains("[EnumMember(Value = \"4G\")]"));
        assert!(types.contains("_4G,"));
    }

    #[test]
    fn doc_comments_escape_xml() {
        let doc = doc_comment("", Some("a < b"), &[], Some("x & y"), &[]);
        assert_eq!(doc, "/// <summary>\n/// a &lt; b\n/// </summary>\n/// <returns>x &amp; y</returns>\n");
    }

    #[test]
    fn transports() {
        assert_eq!(Transport::of(&ParsedType::primitive("string"), false), Transport::Str);
        assert_eq!(Transport::of(&ParsedType::primitive("number"), true), Transport::Json);
        assert_eq!(Transport::of(&ParsedType::any(), false), Transport::Json);
    }
}
