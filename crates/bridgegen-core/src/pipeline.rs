//! End-to-end runs: load → extract → render → validate → write.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::categorize::group_by_category;
use crate::config::{BridgegenConfig, OutputConfig};
use crate::diagnostics::Diagnostics;
use crate::emit::{self, render_typings, EmitContext, RenderedFiles, TypingSource};
use crate::error::{LoadError, PipelineError};
use crate::extract::extract;
use crate::ir::{ParsedAPI, ParsedTypeDefinition};
use crate::loader::{load_project, Project};
use crate::resolver::ProjectResolver;
use crate::typedefs::collect_type_definitions;
use crate::validate::{check_syntax, TypecheckInput, ValidationOptions, ValidationReport, Validator};

/// The extracted IR of an input tree.
#[derive(Debug, Serialize)]
pub struct Analysis {
    pub apis: Vec<ParsedAPI>,
    pub definitions: IndexMap<String, ParsedTypeDefinition>,
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    pub project: Project,
}

impl Analysis {
    pub fn grouped(&self) -> IndexMap<String, Vec<ParsedAPI>> {
        group_by_category(&self.apis)
    }

    fn typecheck_input(&self, output: &OutputConfig) -> Result<TypecheckInput, PipelineError> {
        let sources = TypingSource::from_project(&self.project);
        Ok(TypecheckInput {
            typings: render_typings(&self.apis, &sources, output)?,
            sources,
        })
    }
}

/// Switches for one `generate` run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Overrides `output.sdk_tag`.
    pub sdk_tag: Option<String>,
    /// Render and validate, but write nothing.
    pub dry_run: bool,
    pub validation: ValidationOptions,
}

#[derive(Debug, Serialize)]
pub struct GenerateOutcome {
    /// Output paths, written unless this was a dry run or validation
    /// failed.
    pub files: Vec<PathBuf>,
    pub written: bool,
    /// Outputs of categories that no longer exist, with their Unity `.meta`
    /// files. Deleted when `written`, only listed otherwise.
    pub stale: Vec<PathBuf>,
    pub api_count: usize,
    pub categories: Vec<String>,
    /// Load and extraction diagnostics.
    pub diagnostics: Diagnostics,
    pub report: ValidationReport,
}

impl GenerateOutcome {
    pub fn succeeded(&self) -> bool {
        self.report.passed()
    }
}

/// A configured generator.
pub struct Pipeline<'a> {
    config: &'a BridgegenConfig,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a BridgegenConfig) -> Self {
        Pipeline {
            config,
            cancel: None,
        }
    }

    /// Cancels validation between tiers once the flag is set.
    pub fn with_cancel_flag(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn validator(&self, options: ValidationOptions) -> Validator<'a> {
        let config: &'a BridgegenConfig = self.config;
        let validator = Validator::new(&config.validation, options);
        match self.cancel {
            Some(flag) => validator.with_cancel_flag(flag),
            None => validator,
        }
    }

    /// Loads and extracts without rendering.
    pub fn analyze(&self, input: &Path) -> Result<Analysis, PipelineError> {
        let (project, mut diagnostics) = load_project(input, &self.config.input)?;
        let resolver = ProjectResolver::new(&project);
        let (apis, extracted) = extract(&project, &resolver, &self.config.input);
        diagnostics.extend(extracted);
        let definitions = collect_type_definitions(&apis, &resolver);
        info!(apis = apis.len(), types = definitions.len(), "extracted bridge surface");
        Ok(Analysis {
            apis,
            definitions,
            diagnostics,
            project,
        })
    }

    /// Renders every output file for an analysis.
    pub fn render(&self, analysis: &Analysis, output: &OutputConfig) -> Result<RenderedFiles, PipelineError> {
        let files = emit::render(
            &analysis.grouped(),
            EmitContext {
                output,
                definitions: &analysis.definitions,
            },
        )?;
        Ok(files)
    }

    pub fn generate(&self, options: &GenerateOptions) -> Result<GenerateOutcome, PipelineError> {
        let mut output = self.config.output.clone();
        if let Some(tag) = &options.sdk_tag {
            output.sdk_tag = Some(tag.clone());
        }

        let analysis = self.analyze(&options.input)?;
        let files = self.render(&analysis, &output)?;
        let paths: Vec<PathBuf> = files.keys().map(|name| options.output.join(name)).collect();
        let categories = analysis.grouped().keys().cloned().collect();

        let stale = stale_outputs(&options.output, &files, &output)?;

        let report = check_syntax(&files);
        if report.is_syntax_fatal() {
            warn!("generated code failed the syntax tier; nothing written");
            return Ok(GenerateOutcome {
                files: paths,
                written: false,
                stale,
                api_count: analysis.apis.len(),
                categories,
                diagnostics: analysis.diagnostics,
                report,
            });
        }

        let typings = if options.validation.skip_typecheck {
            None
        } else {
            Some(analysis.typecheck_input(&output)?)
        };
        let report = self
            .validator(options.validation.clone())
            .run(report, &files, typings.as_ref())?;

        let written = !options.dry_run && report.passed();
        if written {
            write_files(&options.output, &files)?;
            remove_files(&stale)?;
            info!(files = files.len(), removed = stale.len(), "wrote {}", options.output.display());
        } else if !report.passed() {
            warn!("validation failed; nothing written");
        }

        Ok(GenerateOutcome {
            files: paths,
            written,
            stale,
            api_count: analysis.apis.len(),
            categories,
            diagnostics: analysis.diagnostics,
            report,
        })
    }

    /// Validates an existing output directory. With `source`, the bridge
    /// typings are re-derived from those declarations for the typecheck tier.
    pub fn validate_dir(
        &self,
        dir: &Path,
        source: Option<&Path>,
        options: ValidationOptions,
    ) -> Result<ValidationReport, PipelineError> {
        let files = read_outputs(dir)?;
        let typings = match source {
            Some(input) if !options.skip_typecheck => {
                let analysis = self.analyze(input)?;
                Some(analysis.typecheck_input(&self.config.output)?)
            }
            _ => None,
        };
        let report = self
            .validator(options)
            .run(ValidationReport::default(), &files, typings.as_ref())?;
        Ok(report)
    }
}

fn write_files(dir: &Path, files: &RenderedFiles) -> Result<(), PipelineError> {
    fs::create_dir_all(dir).map_err(|source| PipelineError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    for (name, source_text) in files {
        let path = dir.join(name);
        fs::write(&path, source_text).map_err(|source| PipelineError::Write { path, source })?;
    }
    Ok(())
}

/// Whether `name` is a per-category output (`AIT.{Category}.cs` or
/// `AppsInToss-{Category}.jslib`), possibly with its `.meta` suffix.
fn is_category_output(name: &str, output: &OutputConfig) -> bool {
    let name = name.strip_suffix(".meta").unwrap_or(name);
    let stem_between = |prefix: &str, suffix: &str| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .is_some_and(|stem| !stem.is_empty())
    };
    stem_between(&format!("{}.", output.class_name()), ".cs")
        || stem_between(&format!("{}-", output.glue_prefix()), ".jslib")
}

fn stale_outputs(
    dir: &Path,
    files: &RenderedFiles,
    output: &OutputConfig,
) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut stale = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let generated = name.strip_suffix(".meta").unwrap_or(&name);
        if is_category_output(&name, output) && !files.contains_key(generated) {
            stale.push(entry.path());
        }
    }
    stale.sort();
    Ok(stale)
}

fn remove_files(paths: &[PathBuf]) -> Result<(), PipelineError> {
    for path in paths {
        fs::remove_file(path).map_err(|source| PipelineError::Write {
            path: path.clone(),
            source,
        })?;
        info!("removed stale {}", path.display());
    }
    Ok(())
}

/// Reads the generated `.cs` and `.jslib` files of an output directory.
fn read_outputs(dir: &Path) -> Result<RenderedFiles, PipelineError> {
    if !dir.is_dir() {
        return Err(LoadError::MissingInput(dir.to_path_buf()).into());
    }
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = RenderedFiles::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !(name.ends_with(".cs") || name.ends_with(".jslib")) || !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        })?;
        files.insert(name, text);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{TierStatus, ValidationState};

    fn offline() -> ValidationOptions {
        ValidationOptions {
            skip_compile: true,
            skip_typecheck: true,
            require_tools: None,
        }
    }

    fn fixture(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, src) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, src).unwrap();
        }
        dir
    }

    #[test]
    fn dry_run_writes_nothing() {
        let input = fixture(&[("device.d.ts", "export declare function getLocale(): string;")]);
        let out = tempfile::tempdir().unwrap();
        let config = BridgegenConfig::default();
        let outcome = Pipeline::new(&config)
            .generate(&GenerateOptions {
                input: input.path().to_path_buf(),
                output: out.path().join("gen"),
                dry_run: true,
                validation: offline(),
                ..GenerateOptions::default()
            })
            .unwrap();
        assert!(!outcome.written);
        assert!(outcome.succeeded());
        assert!(!out.path().join("gen").exists());
        assert!(outcome.files.iter().any(|p| p.ends_with("AIT.Device.cs")));
    }

    #[test]
    fn generate_writes_every_file_and_stamps_the_tag() {
        let input = fixture(&[("device.d.ts", "export declare function getLocale(): string;")]);
        let out = tempfile::tempdir().unwrap();
        let config = BridgegenConfig::default();
        let outcome = Pipeline::new(&config)
            .generate(&GenerateOptions {
                input: input.path().to_path_buf(),
                output: out.path().to_path_buf(),
                sdk_tag: Some("2.1.0".to_string()),
                validation: offline(),
                ..GenerateOptions::default()
            })
            .unwrap();
        assert!(outcome.written);
        assert_eq!(outcome.api_count, 1);
        assert_eq!(outcome.categories, ["device"]);
        for path in &outcome.files {
            assert!(path.is_file(), "{}", path.display());
        }
        let main = fs::read_to_string(out.path().join("AIT.cs")).unwrap();
        assert!(main.contains("SdkVersion = \"2.1.0\""));
        assert_eq!(outcome.report.state, ValidationState::Passed);
    }

    #[test]
    fn rerun_removes_outputs_of_dropped_categories() {
        let input = fixture(&[
            ("device.d.ts", "export declare function getLocale(): string;"),
            ("share.d.ts", "export declare function share(text: string): void;"),
        ]);
        let out = tempfile::tempdir().unwrap();
        let config = BridgegenConfig::default();
        let options = GenerateOptions {
            input: input.path().to_path_buf(),
            output: out.path().to_path_buf(),
            validation: offline(),
            ..GenerateOptions::default()
        };
        let first = Pipeline::new(&config).generate(&options).unwrap();
        assert!(first.stale.is_empty());
        fs::write(out.path().join("AIT.Share.cs.meta"), "guid: 1").unwrap();
        fs::write(out.path().join("AIT.Device.cs.meta"), "guid: 2").unwrap();
        fs::write(out.path().join("README.md"), "kept").unwrap();

        fs::remove_file(input.path().join("share.d.ts")).unwrap();
        let second = Pipeline::new(&config).generate(&options).unwrap();
        assert!(second.written);
        assert_eq!(second.stale.len(), 3);
        for name in ["AIT.Share.cs", "AIT.Share.cs.meta", "AppsInToss-Share.jslib"] {
            assert!(!out.path().join(name).exists(), "{name} left behind");
        }
        for name in ["AIT.Device.cs", "AIT.Device.cs.meta", "AIT.cs", "AIT.Types.cs", "README.md"] {
            assert!(out.path().join(name).exists(), "{name} removed");
        }
    }

    #[test]
    fn stale_outputs_are_only_listed_on_dry_runs() {
        let input = fixture(&[("device.d.ts", "export declare function getLocale(): string;")]);
        let out = fixture(&[("AppsInToss-Old.jslib", "")]);
        let config = BridgegenConfig::default();
        let outcome = Pipeline::new(&config)
            .generate(&GenerateOptions {
                input: input.path().to_path_buf(),
                output: out.path().to_path_buf(),
                dry_run: true,
                validation: offline(),
                ..GenerateOptions::default()
            })
            .unwrap();
        assert_eq!(outcome.stale, [out.path().join("AppsInToss-Old.jslib")]);
        assert!(out.path().join("AppsInToss-Old.jslib").exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_compile_tier_writes_nothing() {
        use std::os::unix::fs::PermissionsExt;

        let tools = tempfile::tempdir().unwrap();
        let compiler = tools.path().join("mcs");
        fs::write(&compiler, "#!/nonexistent/bridgegen-interpreter\n").unwrap();
        fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = BridgegenConfig::default();
        config.validation.compiler = Some(compiler.display().to_string());
        let input = fixture(&[("device.d.ts", "export declare function getLocale(): string;")]);
        let out = tempfile::tempdir().unwrap();
        let outcome = Pipeline::new(&config)
            .generate(&GenerateOptions {
                input: input.path().to_path_buf(),
                output: out.path().join("gen"),
                validation: ValidationOptions {
                    skip_typecheck: true,
                    ..ValidationOptions::default()
                },
                ..GenerateOptions::default()
            })
            .unwrap();
        assert_eq!(outcome.report.compile, TierStatus::Failed);
        assert!(!outcome.written);
        assert!(!out.path().join("gen").exists());
    }

    #[test]
    fn category_outputs_are_recognized() {
        let defaults = OutputConfig::default();
        assert!(is_category_output("AIT.Storage.cs", &defaults));
        assert!(is_category_output("AppsInToss-Storage.jslib.meta", &defaults));
        assert!(!is_category_output("AIT.cs", &defaults));
        assert!(!is_category_output("AITCore.cs", &defaults));
        assert!(!is_category_output("Player.cs", &defaults));

        let renamed = OutputConfig {
            class_name: Some("Toss".into()),
            glue_prefix: Some("TossGlue".into()),
            ..OutputConfig::default()
        };
        assert!(is_category_output("Toss.Storage.cs", &renamed));
        assert!(is_category_output("TossGlue-Storage.jslib", &renamed));
        assert!(!is_category_output("AIT.Storage.cs", &renamed));
        assert!(!is_category_output("AppsInToss-Storage.jslib", &renamed));
    }

    #[test]
    fn validate_dir_reads_generated_files() {
        let out = fixture(&[
            ("AIT.cs", "namespace A { public static partial class AIT { } }\n"),
            ("AIT.Broken.cs", "namespace A { class B {\n"),
            ("notes.txt", "{{{"),
        ]);
        let config = BridgegenConfig::default();
        let report = Pipeline::new(&config)
            .validate_dir(out.path(), None, offline())
            .unwrap();
        assert_eq!(report.state, ValidationState::Failed);
        assert_eq!(report.syntax, TierStatus::Failed);
        assert!(report
            .diagnostics
            .iter()
            .all(|d| d.file.as_deref() == Some(Path::new("AIT.Broken.cs"))));
    }

    #[test]
    fn missing_input_is_a_load_error() {
        let config = BridgegenConfig::default();
        let err = Pipeline::new(&config)
            .analyze(Path::new("/nonexistent/bridgegen-input"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Load(LoadError::MissingInput(_))));
    }
}
