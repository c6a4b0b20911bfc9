//! Typecheck tier: `tsc --noEmit` over the bridge typings in a scratch
//! workspace.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, info, warn};

use super::process::{find_executable, ProcessBuilder};
use super::{parse_tool_line, ToolSeverity};
use crate::config::ValidationConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::emit::{TypingSource, BRIDGE_DIR, TYPINGS_FILE_NAME};
use crate::error::ValidateError;

const AMBIENT_DIR: &str = "ambient";

/// Inputs of the typecheck tier.
#[derive(Debug, Clone)]
pub struct TypecheckInput {
    /// Rendered `bridge-check.ts`.
    pub typings: String,
    /// Declaration files the typings import.
    pub sources: Vec<TypingSource>,
}

/// The configured `tsc`, or the one on `PATH`.
pub fn locate_tsc(config: &ValidationConfig) -> Option<PathBuf> {
    find_executable(config.tsc.as_deref().unwrap_or("tsc"))
}

/// Result of a typecheck run that actually happened.
#[derive(Debug)]
pub struct TypecheckRun {
    pub passed: bool,
    pub diagnostics: Diagnostics,
}

fn tsconfig(has_ambient: bool) -> serde_json::Value {
    let mut include = vec![json!(TYPINGS_FILE_NAME)];
    if has_ambient {
        include.push(json!(format!("{AMBIENT_DIR}/**/*.d.ts")));
    }
    json!({
        "compilerOptions": {
            "strict": true,
            "noEmit": true,
            "skipLibCheck": true,
            "target": "ES2020",
            "module": "ESNext",
            "moduleResolution": "node",
            "lib": ["ES2020", "DOM"],
            "baseUrl": ".",
            "paths": { "@bridge/*": [format!("{BRIDGE_DIR}/*")] },
            "types": []
        },
        "include": include
    })
}

/// Lays out the workspace: typings at the root, declarations under
/// `bridge/`, ambient declarations under `ambient/`.
fn prepare(root: &Path, input: &TypecheckInput, config: &ValidationConfig) -> Result<(), ValidateError> {
    fs::write(root.join(TYPINGS_FILE_NAME), &input.typings)?;

    for source in &input.sources {
        let target = root.join(BRIDGE_DIR).join(&source.relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source.path, &target)?;
    }

    let ambient = config.ambient_declarations();
    for (index, path) in ambient.iter().enumerate() {
        let path = Path::new(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("ambient{index}.d.ts"));
        let dir = root.join(AMBIENT_DIR).join(index.to_string());
        fs::create_dir_all(&dir)?;
        if let Err(err) = fs::copy(path, dir.join(name)) {
            warn!(path = %path.display(), "skipping ambient declaration: {}", err);
        }
    }

    let config_text = serde_json::to_string_pretty(&tsconfig(!ambient.is_empty()))
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    fs::write(root.join("tsconfig.json"), config_text)?;
    Ok(())
}

/// The API whose check function encloses one-based `line` of the typings.
fn api_at_line(typings: &str, line: usize) -> Option<String> {
    typings
        .lines()
        .take(line)
        .filter_map(|l| l.strip_prefix("export function check_"))
        .last()
        .and_then(|rest| rest.split('(').next())
        .map(str::to_string)
}

/// Runs `tsc` over the typings.
pub fn typecheck(
    tsc: &Path,
    input: &TypecheckInput,
    config: &ValidationConfig,
) -> Result<TypecheckRun, ValidateError> {
    let workdir = tempfile::Builder::new().prefix("bridgegen-tsc-").tempdir()?;
    prepare(workdir.path(), input, config)?;

    let builder = ProcessBuilder::new(tsc)
        .cwd(workdir.path())
        .args(["-p", "tsconfig.json", "--pretty", "false"]);
    info!(sources = input.sources.len(), "typechecking bridge typings");

    let mut diagnostics = Diagnostics::new();
    let output = match builder.exec_with_timeout(config.typecheck_timeout()) {
        Ok(output) => output,
        Err(ValidateError::Timeout { tool, seconds }) => {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::TypeCheckFailure,
                format!("`{tool}` timed out after {seconds}s and was killed"),
            ));
            return Ok(TypecheckRun {
                passed: false,
                diagnostics,
            });
        }
        Err(err) => return Err(err),
    };

    for line in output.combined().lines() {
        let Some(found) = parse_tool_line(line) else {
            continue;
        };
        if found.severity != ToolSeverity::Error {
            continue;
        }
        let mut diagnostic = Diagnostic::new(DiagnosticKind::TypeCheckFailure, found.message)
            .with_file(&found.file)
            .at(found.line, found.column)
            .with_code(found.code);
        if found.file.ends_with(TYPINGS_FILE_NAME) {
            if let Some(api) = api_at_line(&input.typings, found.line) {
                diagnostic = diagnostic.with_api(api);
            }
        }
        diagnostics.push(diagnostic);
    }

    if !output.success() && diagnostics.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::TypeCheckFailure,
            format!("tsc exited with {:?}: {}", output.code, output.combined().trim()),
        ));
    }

    debug!(errors = diagnostics.len(), "typecheck finished");
    Ok(TypecheckRun {
        passed: diagnostics.is_empty(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsconfig_maps_bridge_modules() {
        let config = tsconfig(true);
        assert_eq!(config["compilerOptions"]["paths"]["@bridge/*"][0], "bridge/*");
        assert_eq!(config["compilerOptions"]["noEmit"], true);
        assert_eq!(config["include"][1], "ambient/**/*.d.ts");
        assert_eq!(tsconfig(false)["include"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn workspace_layout_copies_declarations() {
        let input_dir = tempfile::tempdir().unwrap();
        let nested = input_dir.path().join("device");
        fs::create_dir_all(&nested).unwrap();
        let source = nested.join("locale.d.ts");
        fs::write(&source, "export declare function getLocale(): string;").unwrap();

        let input = TypecheckInput {
            typings: "export function check_getLocale(): void {}\n".to_string(),
            sources: vec![TypingSource {
                path: source,
                relative: "device/locale.d.ts".to_string(),
                is_module: true,
            }],
        };
        let root = tempfile::tempdir().unwrap();
        prepare(root.path(), &input, &ValidationConfig::default()).unwrap();

        assert!(root.path().join("bridge/device/locale.d.ts").is_file());
        assert!(root.path().join(TYPINGS_FILE_NAME).is_file());
        let written = fs::read_to_string(root.path().join("tsconfig.json")).unwrap();
        assert!(written.contains("\"@bridge/*\""));
    }

    #[test]
    fn errors_are_attributed_to_the_enclosing_check() {
        let typings = "\
declare function __value<T>(): T;

export function check_getLocale(): void {
  void src_0.getLocale(...__value<Parameters<typeof src_0.getLocale>>());
}

export function check_share(): void {
  void src_1.share(...__value<Parameters<typeof src_1.share>>());
}
";
        assert_eq!(api_at_line(typings, 4).as_deref(), Some("getLocale"));
        assert_eq!(api_at_line(typings, 8).as_deref(), Some("share"));
        assert_eq!(api_at_line(typings, 1), None);
    }
}
