//! The fixed platform pair, emitted as-is next to the generated files.

use serde::Serialize;

use super::templates;
use crate::config::OutputConfig;
use crate::error::EmitError;

#[derive(Serialize)]
struct View<'a> {
    namespace: &'a str,
    class_name: &'a str,
    sdk_tag: &'a str,
}

/// `{class}.WebGL.cs` and `{glue}-WebGL.jslib`.
pub(crate) fn render_platform(output: &OutputConfig) -> Result<Vec<(String, String)>, EmitError> {
    let view = View {
        namespace: output.namespace(),
        class_name: output.class_name(),
        sdk_tag: output.sdk_tag(),
    };
    Ok(vec![
        (
            format!("{}.WebGL.cs", output.class_name()),
            templates::render("platform/webgl.cs", &view)?,
        ),
        (
            format!("{}-WebGL.jslib", output.glue_prefix()),
            templates::render("platform/webgl.jslib", &view)?,
        ),
    ])
}
