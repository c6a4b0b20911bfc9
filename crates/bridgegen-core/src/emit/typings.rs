//! Bridge typings: a TypeScript rendition of every glue call, checked by
//! `tsc` against the bridge library's own declarations.

use std::path::PathBuf;

use serde::Serialize;

use super::csharp::Transport;
use super::jslib::{glue_call, return_kind, GlueCall};
use super::templates;
use crate::config::OutputConfig;
use crate::error::EmitError;
use crate::ir::ParsedAPI;
use crate::loader::Project;

pub const TYPINGS_FILE_NAME: &str = "bridge-check.ts";

/// Directory the declarations are copied to inside a typecheck workspace.
pub const BRIDGE_DIR: &str = "bridge";

/// A declaration file as seen from the typings.
#[derive(Debug, Clone)]
pub struct TypingSource {
    pub path: PathBuf,
    /// `/`-separated path relative to the input root.
    pub relative: String,
    pub is_module: bool,
}

impl TypingSource {
    pub fn from_project(project: &Project) -> Vec<TypingSource> {
        project
            .files
            .iter()
            .map(|file| TypingSource {
                path: file.path.clone(),
                relative: file.relative.clone(),
                is_module: file.is_module,
            })
            .collect()
    }

    /// Module specifier resolved through the `@bridge/*` path mapping.
    fn specifier(&self) -> String {
        let stem = [".d.ts", ".d.mts", ".d.cts", ".ts"]
            .iter()
            .find_map(|suffix| self.relative.strip_suffix(suffix))
            .unwrap_or(&self.relative);
        format!("@bridge/{stem}")
    }
}

#[derive(Serialize)]
struct Import {
    alias: String,
    module: String,
}

#[derive(Serialize)]
struct Check {
    name: String,
    lines: Vec<String>,
}

const PARAMS: &str = "__Params";

/// Body of one check: the values the glue decodes, typed the way they
/// arrive, passed through the exact argument expressions the glue uses.
fn check_lines(api: &ParsedAPI, target: &str) -> Vec<String> {
    let GlueCall { inputs, handlers, args } = glue_call(api);
    let mut lines = Vec::new();

    if inputs.iter().any(|input| input.transport == Transport::Json) {
        lines.push(format!("type {PARAMS} = Parameters<typeof {target}>;"));
    }
    for input in &inputs {
        let declared = format!("{PARAMS}[{}]", input.index);
        lines.push(match input.transport {
            _ if input.rest => format!(
                "const {} = __value<__Rest<{PARAMS}, {}>>();",
                input.name, input.index
            ),
            _ if input.data_only => {
                format!("const {} = __value<__Data<{declared}>>();", input.name)
            }
            Transport::Str => format!("const {}: string = __value();", input.name),
            Transport::Num => format!("const {}: number = __value();", input.name),
            Transport::Bool => format!("const {}: boolean = __value();", input.name),
            Transport::Json => format!("const {} = __value<{declared}>();", input.name),
        });
    }
    if !handlers.is_empty() {
        let members = handlers
            .iter()
            .map(|name| format!("{name}: __handler"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("const handlers = {{ {members} }};"));
    }

    let call = format!("{target}({})", args.join(", "));
    let returns_string = !api.is_async
        && !api.is_callback_based
        && !api.is_event_subscription
        && return_kind(&api.return_type) == "string";
    lines.push(if returns_string {
        format!("const __result: string | null | undefined = {call};")
    } else {
        format!("void {call};")
    });
    lines
}

#[derive(Serialize)]
struct View<'a> {
    sdk_tag: &'a str,
    references: Vec<String>,
    imports: Vec<Import>,
    checks: Vec<Check>,
}

/// Renders `bridge-check.ts` for the given APIs.
pub fn render_typings(
    apis: &[ParsedAPI],
    sources: &[TypingSource],
    output: &OutputConfig,
) -> Result<String, EmitError> {
    let mut references = Vec::new();
    let mut imports = Vec::new();
    let mut roots: Vec<(PathBuf, Option<String>)> = Vec::new();

    for (index, source) in sources.iter().enumerate() {
        if source.is_module {
            let alias = format!("src_{index}");
            imports.push(Import {
                alias: alias.clone(),
                module: source.specifier(),
            });
            roots.push((source.path.clone(), Some(alias)));
        } else {
            references.push(format!("./{BRIDGE_DIR}/{}", source.relative));
            roots.push((source.path.clone(), None));
        }
    }

    let checks = apis
        .iter()
        .map(|api| {
            let root = roots
                .iter()
                .find(|(path, _)| *path == api.source_file)
                .and_then(|(_, alias)| alias.as_deref());
            let target = match root {
                Some(alias) => format!("{alias}.{}", api.original_name),
                None => api.original_name.clone(),
            };
            Check {
                name: api.name.clone(),
                lines: check_lines(api, &target),
            }
        })
        .collect();

    templates::render(
        "typings/bridge_check.ts",
        &View {
            sdk_tag: output.sdk_tag(),
            references,
            imports,
            checks,
        },
    )
}
