//! Process-wide template cache.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;
use tera::{Context, Tera, Value};

use super::naming::to_pascal_case;
use crate::error::EmitError;

static TEMPLATES: OnceLock<Result<Tera, String>> = OnceLock::new();

const SOURCES: &[(&str, &str)] = &[
    ("header", include_str!("../../templates/header.tera")),
    ("csharp/main.cs", include_str!("../../templates/csharp/main.cs.tera")),
    ("csharp/category.cs", include_str!("../../templates/csharp/category.cs.tera")),
    ("csharp/method.cs", include_str!("../../templates/csharp/method.cs.tera")),
    ("csharp/core.cs", include_str!("../../templates/csharp/core.cs.tera")),
    ("csharp/types.cs", include_str!("../../templates/csharp/types.cs.tera")),
    ("jslib/category.jslib", include_str!("../../templates/jslib/category.jslib.tera")),
    ("jslib/entry.jslib", include_str!("../../templates/jslib/entry.jslib.tera")),
    ("jslib/core.jslib", include_str!("../../templates/jslib/core.jslib.tera")),
    ("typings/bridge_check.ts", include_str!("../../templates/typings/bridge_check.ts.tera")),
    ("platform/webgl.cs", include_str!("../../templates/platform/webgl.cs.tera")),
    ("platform/webgl.jslib", include_str!("../../templates/platform/webgl.jslib.tera")),
];

/// The compiled template set, built on first use.
fn templates() -> Result<&'static Tera, EmitError> {
    TEMPLATES
        .get_or_init(build)
        .as_ref()
        .map_err(|message| EmitError::Template {
            template: "<init>".to_string(),
            message: message.clone(),
        })
}

fn build() -> Result<Tera, String> {
    let mut tera = Tera::default();
    tera.autoescape_on(Vec::new());
    tera.register_filter("pascal", pascal_filter);
    tera.add_raw_templates(SOURCES.iter().copied())
        .map_err(|err| EmitError::template("<init>", err).to_string())?;
    Ok(tera)
}

fn pascal_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    match value.as_str() {
        Some(s) => Ok(Value::String(to_pascal_case(s))),
        None => Err(tera::Error::msg("`pascal` expects a string")),
    }
}

/// Renders a named template with a serializable context.
pub(crate) fn render<T: Serialize>(name: &str, data: &T) -> Result<String, EmitError> {
    let context = Context::from_serialize(data).map_err(|err| EmitError::template(name, err))?;
    templates()?
        .render(name, &context)
        .map_err(|err| EmitError::template(name, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_compiles() {
        let tera = templates().unwrap();
        for (name, _) in SOURCES {
            assert!(tera.get_template_names().any(|n| n == *name), "{name}");
        }
    }

    #[test]
    fn initialization_happens_once() {
        let first = templates().unwrap() as *const Tera;
        let second = templates().unwrap() as *const Tera;
        assert_eq!(first, second);
    }
}
