//! Renders the IR into native stubs, runtime glue and bridge typings.
//!
//! Every renderer here is a pure function of its inputs. The only shared
//! state is the template cache in [`templates`].

mod csharp;
mod jslib;
pub mod naming;
mod platform;
mod templates;
mod typings;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::categorize::{check_collisions, output_stem};
use crate::config::OutputConfig;
use crate::error::EmitError;
use crate::ir::{ParsedAPI, ParsedTypeDefinition};

pub use csharp::CsTypes;
pub use typings::{render_typings, TypingSource, BRIDGE_DIR, TYPINGS_FILE_NAME};

/// Name of the shared runtime class file.
pub const CORE_FILE_NAME: &str = "AITCore.cs";

/// Output stems owned by fixed files.
const RESERVED_STEMS: &[&str] = &["Types", "WebGL", "Core"];

/// Rendered output: file name to source text.
pub type RenderedFiles = BTreeMap<String, String>;

/// Everything the emitters need besides the APIs.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub output: &'a OutputConfig,
    pub definitions: &'a IndexMap<String, ParsedTypeDefinition>,
}

/// Renders every output file for the grouped APIs.
pub fn render(
    grouped: &IndexMap<String, Vec<ParsedAPI>>,
    cx: EmitContext<'_>,
) -> Result<RenderedFiles, EmitError> {
    check_collisions(grouped.keys().map(String::as_str))?;
    check_reserved(grouped.keys().map(String::as_str))?;
    check_method_names(grouped)?;

    let class = cx.output.class_name();
    let glue = cx.output.glue_prefix();
    let mut files = RenderedFiles::new();
    let mut types = CsTypes::with_definitions(cx.definitions);

    let api_count = grouped.values().map(Vec::len).sum();
    files.insert(format!("{class}.cs"), csharp::render_main(cx.output, api_count)?);
    files.insert(CORE_FILE_NAME.to_string(), csharp::render_core(cx.output)?);

    for (category, apis) in grouped {
        let stem = output_stem(category);
        debug!(category = %category, apis = apis.len(), "rendering category");
        files.insert(
            format!("{class}.{stem}.cs"),
            csharp::render_category(cx.output, category, apis, &mut types)?,
        );
        files.insert(
            format!("{glue}-{stem}.jslib"),
            jslib::render_category(cx.output, category, apis)?,
        );
    }

    // Rendered last: method rendering registers the synthetic classes.
    files.insert(format!("{class}.Types.cs"), csharp::render_types(cx.output, &types)?);
    files.insert(format!("{glue}-Core.jslib"), jslib::render_core(cx.output)?);

    for (name, source) in platform::render_platform(cx.output)? {
        files.insert(name, source);
    }
    Ok(files)
}

fn check_reserved<'a>(categories: impl IntoIterator<Item = &'a str>) -> Result<(), EmitError> {
    for category in categories {
        let stem = output_stem(category);
        if RESERVED_STEMS.contains(&stem.as_str()) {
            return Err(EmitError::CategoryCollision {
                first: "(generated)".to_string(),
                second: category.to_string(),
                file: format!("AIT.{stem}.cs"),
            });
        }
    }
    Ok(())
}

/// All categories share one partial class, so method names must be unique
/// across them.
fn check_method_names(grouped: &IndexMap<String, Vec<ParsedAPI>>) -> Result<(), EmitError> {
    let mut seen: IndexMap<&str, &str> = IndexMap::new();
    for (category, apis) in grouped {
        for api in apis {
            if let Some(first) = seen.insert(&api.display_name, category) {
                return Err(EmitError::DuplicateMethod {
                    method: api.display_name.clone(),
                    first: first.to_string(),
                    second: category.clone(),
                });
            }
        }
    }
    Ok(())
}
