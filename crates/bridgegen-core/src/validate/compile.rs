//! Compile tier: every generated `.cs` file in one compilation unit.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::process::{find_executable, ProcessBuilder};
use super::{parse_tool_line, ToolSeverity};
use crate::config::ValidationConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::emit::RenderedFiles;
use crate::error::ValidateError;

/// Stub surface of UnityEngine and Newtonsoft.Json.
pub const STUBS_FILE_NAME: &str = "UnityStubs.cs";
const STUBS: &str = include_str!("../../templates/stubs/UnityStubs.cs");

/// Symbols defined for the compilation so the native branch is compiled.
const DEFINES: &str = "UNITY_WEBGL";

const ASSEMBLY_NAME: &str = "BridgeStubs";

/// Compiler front ends the tier knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerKind {
    Mcs,
    Csc,
    Dotnet,
}

impl CompilerKind {
    fn of(program: &Path) -> CompilerKind {
        let stem = program
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match stem.as_str() {
            "dotnet" => CompilerKind::Dotnet,
            "csc" => CompilerKind::Csc,
            _ => CompilerKind::Mcs,
        }
    }
}

/// A located compiler.
#[derive(Debug, Clone)]
pub struct Compiler {
    pub kind: CompilerKind,
    pub program: PathBuf,
}

impl Compiler {
    /// The configured compiler, or the first of `mcs`, `csc`, `dotnet` on
    /// `PATH`.
    pub fn locate(config: &ValidationConfig) -> Option<Compiler> {
        let candidates: Vec<&str> = match config.compiler.as_deref() {
            Some(explicit) => vec![explicit],
            None => vec!["mcs", "csc", "dotnet"],
        };
        candidates.into_iter().find_map(|name| {
            find_executable(name).map(|program| Compiler {
                kind: CompilerKind::of(&program),
                program,
            })
        })
    }

    fn command(&self, workdir: &Path, sources: &[PathBuf], references: &[String]) -> Result<ProcessBuilder, ValidateError> {
        let out = workdir.join(format!("{ASSEMBLY_NAME}.dll"));
        match self.kind {
            CompilerKind::Mcs | CompilerKind::Csc => {
                let mut builder = ProcessBuilder::new(&self.program)
                    .cwd(workdir)
                    .arg("-target:library")
                    .arg(format!("-out:{}", out.display()))
                    .arg(format!("-define:{DEFINES}"))
                    .arg("-nowarn:1591");
                for reference in references {
                    builder = builder.arg(format!("-reference:{reference}"));
                }
                Ok(builder.args(sources))
            }
            CompilerKind::Dotnet => {
                let project = workdir.join(format!("{ASSEMBLY_NAME}.csproj"));
                fs::write(&project, csproj(sources, references))?;
                Ok(ProcessBuilder::new(&self.program)
                    .cwd(workdir)
                    .arg("build")
                    .arg(&project)
                    .args(["-nologo", "-v:q", "-clp:NoSummary"]))
            }
        }
    }
}

fn csproj(sources: &[PathBuf], references: &[String]) -> String {
    let mut xml = String::from(
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n\
         \x20 <PropertyGroup>\n\
         \x20   <TargetFramework>netstandard2.1</TargetFramework>\n\
         \x20   <EnableDefaultCompileItems>false</EnableDefaultCompileItems>\n\
         \x20   <Nullable>disable</Nullable>\n",
    );
    xml.push_str(&format!("    <DefineConstants>{DEFINES}</DefineConstants>\n"));
    xml.push_str("  </PropertyGroup>\n  <ItemGroup>\n");
    for source in sources {
        xml.push_str(&format!("    <Compile Include=\"{}\" />\n", source.display()));
    }
    for reference in references {
        let name = Path::new(reference)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| reference.clone());
        xml.push_str(&format!(
            "    <Reference Include=\"{name}\">\n      <HintPath>{reference}</HintPath>\n    </Reference>\n"
        ));
    }
    xml.push_str("  </ItemGroup>\n</Project>\n");
    xml
}

/// Result of a compile run that actually happened.
#[derive(Debug)]
pub struct CompileRun {
    pub passed: bool,
    pub diagnostics: Diagnostics,
}

/// Compiles the `.cs` files of `files` in a scratch directory.
pub fn compile(
    compiler: &Compiler,
    files: &RenderedFiles,
    config: &ValidationConfig,
) -> Result<CompileRun, ValidateError> {
    let workdir = tempfile::Builder::new().prefix("bridgegen-compile-").tempdir()?;
    let src = workdir.path().join("src");
    fs::create_dir_all(&src)?;

    let mut sources = Vec::new();
    for (name, source) in files.iter().filter(|(name, _)| name.ends_with(".cs")) {
        let path = src.join(name);
        fs::write(&path, source)?;
        sources.push(path);
    }
    if config.use_stubs() {
        let path = src.join(STUBS_FILE_NAME);
        fs::write(&path, STUBS)?;
        sources.push(path);
    }

    let builder = compiler.command(workdir.path(), &sources, config.references())?;
    info!(compiler = %builder.tool_name(), files = sources.len(), "compiling generated stubs");

    let mut diagnostics = Diagnostics::new();
    let output = match builder.exec_with_timeout(config.compile_timeout()) {
        Ok(output) => output,
        Err(ValidateError::Timeout { tool, seconds }) => {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::CompileFailure,
                format!("`{tool}` timed out after {seconds}s and was killed"),
            ));
            return Ok(CompileRun {
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
        let file = Path::new(&found.file)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&found.file));
        diagnostics.push(
            Diagnostic::new(DiagnosticKind::CompileFailure, found.message)
                .with_file(file)
                .at(found.line, found.column)
                .with_code(found.code),
        );
    }

    // A failing exit without parseable lines still fails the tier.
    if !output.success() && diagnostics.is_empty() {
        let detail = output.combined();
        let detail = detail.trim();
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::CompileFailure,
            format!(
                "compiler exited with {:?}{}{}",
                output.code,
                if detail.is_empty() { "" } else { ": " },
                detail
            ),
        ));
    }

    debug!(errors = diagnostics.len(), "compile finished");
    Ok(CompileRun {
        passed: diagnostics.is_empty(),
        diagnostics,
    })
}
