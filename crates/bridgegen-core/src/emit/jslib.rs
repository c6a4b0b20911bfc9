//! Runtime glue (Emscripten jslib) rendering.

use serde::Serialize;

use super::csharp::{escape_string, Transport};
use super::naming::{js_default, js_param_name, to_pascal_case};
use super::templates;
use crate::categorize::output_stem;
use crate::config::OutputConfig;
use crate::error::EmitError;
use crate::ir::{DiscriminantForm, ParsedAPI, ParsedType, TypeKind};
use crate::mapper::{ERROR_CODE_TAG, SUCCESS_TAG};

#[derive(Debug, Serialize)]
struct Handler {
    name: String,
    id: String,
    /// `emit` for data callbacks, `fail` for the error callback.
    action: &'static str,
    /// Named callbacks may be registered with an empty id.
    guarded: bool,
}

#[derive(Debug, Serialize)]
struct EntryView {
    kind: &'static str,
    name: String,
    params: String,
    decode: Vec<String>,
    call: String,
    returns: &'static str,
    result: String,
    default_value: String,
    ids: Vec<String>,
    handlers: Vec<Handler>,
}

fn decode(name: &str, transport: Transport) -> Option<String> {
    match transport {
        Transport::Str => Some(format!("{name} = UTF8ToString({name});")),
        Transport::Num => None,
        Transport::Bool => Some(format!("{name} = !!{name};")),
        Transport::Json => Some(format!("{name} = AIT.parse({name});")),
    }
}

/// How a sync result is handed back to the native side.
pub(crate) fn return_kind(ty: &ParsedType) -> &'static str {
    match (&ty.kind, ty.name.as_str()) {
        (TypeKind::Primitive, "void") => "void",
        (TypeKind::Primitive, "string") => "string",
        (TypeKind::Primitive, "number") => "number",
        (TypeKind::Primitive, "boolean") => "bool",
        (TypeKind::Union { discriminant: None, .. }, _) if !ty.name.is_empty() => "json",
        (TypeKind::Union { discriminant: None, .. }, _) => "string",
        _ => "json",
    }
}

/// Expression normalizing a resolved value so it always carries its tag.
fn normalized_result(ty: Option<&ParsedType>) -> String {
    match ty.and_then(ParsedType::discriminant) {
        Some(d) if d.form == DiscriminantForm::ErrorCode => {
            format!("AIT.withTag(result, \"{ERROR_CODE_TAG}\", \"{SUCCESS_TAG}\")")
        }
        _ => "result".to_string(),
    }
}

/// A value a glue entry decodes before calling the bridge.
#[derive(Debug, Clone)]
pub(crate) struct GlueInput {
    pub name: String,
    /// Position of the declared parameter this value is passed as.
    pub index: usize,
    pub transport: Transport,
    pub rest: bool,
    /// The data half of a callback options object: its function members
    /// arrive as handlers instead.
    pub data_only: bool,
}

/// The bridge call a glue entry makes. The argument expressions are valid
/// both as JavaScript and as TypeScript, so the typings reuse them verbatim.
#[derive(Debug, Clone, Default)]
pub(crate) struct GlueCall {
    pub inputs: Vec<GlueInput>,
    /// Members of the `handlers` object, in order; empty when none is built.
    pub handlers: Vec<String>,
    pub args: Vec<String>,
}

pub(crate) fn glue_call(api: &ParsedAPI) -> GlueCall {
    let mut call = GlueCall::default();

    if api.is_event_subscription {
        let event = escape_string(api.event_name.as_deref().unwrap_or_default());
        call.handlers = vec!["onEvent".to_string(), "onError".to_string()];
        call.args = vec![format!("\"{event}\""), "handlers".to_string()];
        return call;
    }

    let (data_params, callback_param) = match (api.is_callback_based, api.parameters.split_last()) {
        (true, Some((last, leading))) => (leading, Some(last)),
        _ => (&api.parameters[..], None),
    };

    for (index, param) in data_params.iter().enumerate() {
        let name = js_param_name(&param.name);
        call.args.push(if param.rest {
            format!("...{name}")
        } else {
            name.clone()
        });
        call.inputs.push(GlueInput {
            name,
            index,
            transport: Transport::of(&param.ty, param.optional),
            rest: param.rest,
            data_only: false,
        });
    }

    if !api.is_callback_based {
        return call;
    }

    let properties = callback_param.map(|p| p.ty.properties()).unwrap_or_default();
    let primary = if properties.iter().any(|prop| prop.name == "onSuccess") {
        "onSuccess"
    } else {
        "onEvent"
    };
    call.handlers = [primary, "onError"]
        .into_iter()
        .map(str::to_string)
        .chain(api.named_callbacks.iter().map(|c| c.name.clone()))
        .collect();

    let data = callback_param.filter(|_| properties.iter().any(|prop| !prop.ty.is_function()));
    match data {
        Some(param) => {
            let name = js_param_name(&param.name);
            call.args.push(format!("Object.assign({{}}, {name}, handlers)"));
            call.inputs.push(GlueInput {
                name,
                index: data_params.len(),
                transport: Transport::Json,
                rest: false,
                data_only: true,
            });
        }
        None => call.args.push("handlers".to_string()),
    }
    call
}

fn build_entry(output: &OutputConfig, api: &ParsedAPI) -> EntryView {
    let target = format!("{}.{}", output.bridge_global(), api.original_name);
    let glue = glue_call(api);
    let mut view = EntryView {
        kind: "sync",
        name: api.name.clone(),
        params: String::new(),
        decode: Vec::new(),
        call: format!("{target}({})", glue.args.join(", ")),
        returns: "void",
        result: "result".to_string(),
        default_value: String::new(),
        ids: Vec::new(),
        handlers: Vec::new(),
    };

    let mut params = Vec::new();
    for input in &glue.inputs {
        let line = if input.rest {
            Some(format!("{0} = AIT.parse({0}) || [];", input.name))
        } else {
            decode(&input.name, input.transport)
        };
        view.decode.extend(line);
        params.push(input.name.clone());
    }

    if api.is_event_subscription || api.is_callback_based {
        view.kind = if api.is_event_subscription { "event" } else { "callback" };
        view.ids.push("subscriptionId".to_string());
        for (position, handler) in glue.handlers.iter().enumerate() {
            // The resolve/reject pair shares the subscription id.
            let (id, action, guarded) = match position {
                0 => ("subscriptionId".to_string(), "emit", false),
                1 => ("subscriptionId".to_string(), "fail", false),
                _ => (format!("{handler}Id"), "emit", true),
            };
            if guarded {
                view.ids.push(id.clone());
            }
            view.handlers.push(Handler {
                name: handler.clone(),
                id,
                action,
                guarded,
            });
        }
        params.extend(view.ids.iter().cloned());
        view.params = params.join(", ");
        return view;
    }

    if api.is_async {
        view.kind = "async";
        params.push("callbackId".to_string());
        view.result = normalized_result(api.resolved_type());
    } else {
        view.returns = return_kind(&api.return_type);
        view.default_value = js_default(&api.return_type);
    }
    view.params = params.join(", ");
    view
}

pub(crate) fn render_category(
    output: &OutputConfig,
    category: &str,
    apis: &[ParsedAPI],
) -> Result<String, EmitError> {
    #[derive(Serialize)]
    struct View<'a> {
        sdk_tag: &'a str,
        library: String,
        entries: Vec<String>,
    }

    let entries = apis
        .iter()
        .map(|api| templates::render("jslib/entry.jslib", &build_entry(output, api)))
        .collect::<Result<Vec<_>, _>>()?;
    templates::render(
        "jslib/category.jslib",
        &View {
            sdk_tag: output.sdk_tag(),
            library: format!("AIT{}Library", to_pascal_case(&output_stem(category))),
            entries,
        },
    )
}

pub(crate) fn render_core(output: &OutputConfig) -> Result<String, EmitError> {
    #[derive(Serialize)]
    struct View<'a> {
        sdk_tag: &'a str,
    }
    templates::render(
        "jslib/core.jslib",
        &View {
            sdk_tag: output.sdk_tag(),
        },
    )
}

#[cfg(test)]
mod tests {
    use crate::emit::tests::render_sources;

    #[test]
    fn async_entries_resolve_through_callback_ids() {
        let files = render_sources(&[(
            "storage.d.ts",
            "export declare const Storage: { getItem(key: string): Promise<string | null> };",
        )]);
        let js = &files["AppsInToss-Storage.jslib"];
        assert!(js.contains("__StorageGetItem_Internal: function (key, callbackId) {"));
        assert!(js.contains("key = UTF8ToString(key);"));
        assert!(js.contains("Promise.resolve(window.AppsInToss.Storage.getItem(key))"));
        assert!(js.contains("autoAddDeps(AITStorageLibrary, '$AIT');"));
        assert!(js.contains("mergeInto(LibraryManager.library, AITStorageLibrary);"));
    }

    #[test]
    fn sync_entries_return_defaults_on_failure() {
        let files = render_sources(&[(
            "device.d.ts",
            "export declare function getLocale(): string;\nexport declare function isTablet(): boolean;",
        )]);
        let js = &files["AppsInToss-Device.jslib"];
        assert!(js.contains("return AIT.allocString(window.AppsInToss.getLocale());"));
        assert!(js.contains("return AIT.allocString('');"));
        assert!(js.contains("return window.AppsInToss.isTablet() ? 1 : 0;"));
    }

    #[test]
    fn callback_entries_register_one_id_per_named_callback() {
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
        let js = &files["AppsInToss-Ads.jslib"];
        assert!(js.contains("function (args, subscriptionId, onLoadedId, onClosedId)"));
        assert!(js.contains("onLoadedId = UTF8ToString(onLoadedId);"));
        assert!(js.contains("onClosedId = UTF8ToString(onClosedId);"));
        assert!(js.contains("if (onLoadedId) AIT.emit(onLoadedId, data);"));
        assert!(js.contains("window.AppsInToss.loadAd(Object.assign({}, args, handlers))"));
        assert!(js.contains("AIT.track(subscriptionId, unsubscribe);"));
    }

    #[test]
    fn event_entries_pass_the_event_name() {
        let files = render_sources(&[(
            "events.d.ts",
            "export declare const appEvents: {\n\
               addEventListener(event: 'pause' | 'resume', handler: { onEvent: () => void }): () => void;\n\
             };",
        )]);
        let js = &files["AppsInToss-Events.jslib"];
        assert!(js.contains("window.AppsInToss.appEvents.addEventListener(\"pause\", handlers)"));
        assert!(js.contains("window.AppsInToss.appEvents.addEventListener(\"resume\", handlers)"));
    }

    #[test]
    fn rest_parameters_are_spread_into_the_call() {
        let files = render_sources(&[(
            "logger.d.ts",
            "export declare function log(level: number, ...messages: string[]): void;",
        )]);
        let js = &files["AppsInToss-Logger.jslib"];
        assert!(js.contains("__log_Internal: function (level, messages) {"));
        assert!(js.contains("messages = AIT.parse(messages) || [];"));
        assert!(js.contains("window.AppsInToss.log(level, ...messages);"));
    }

    #[test]
    fn literal_union_failures_match_the_native_default() {
        let files = render_sources(&[(
            "theme.d.ts",
            "export type Scheme = 'system' | 'custom';\n\
             export declare function getTheme(): 'light' | 'dark';\n\
             export declare function getScheme(): Scheme;",
        )]);
        let js = &files["AppsInToss-Theme.jslib"];
        assert!(!js.contains("AIT.allocString('null')"), "{js}");
        assert!(js.contains("return AIT.allocString('');"));
        assert!(js.contains("return AIT.allocJson(\"system\");"));

        let cs = &files["AIT.Theme.cs"];
        assert!(cs.contains("public static string GetTheme()"));
        assert!(cs.contains("return \"\";"));
        assert!(cs.contains("return default(Scheme);"));
        assert!(!cs.contains("return null;"));
    }

    #[test]
    fn error_code_results_are_tagged() {
        let files = render_sources(&[(
            "payment.d.ts",
            "export declare function pay(): Promise<{ paymentKey: string } | 'CANCELED'>;",
        )]);
        assert!(files["AppsInToss-Payment.jslib"].contains("AIT.withTag(result, \"_type\", \"success\")"));
    }
}
