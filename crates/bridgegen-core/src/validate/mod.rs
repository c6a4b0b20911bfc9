//! Escalating validation of generated code.
//!
//! A report moves `Unvalidated → SyntaxChecked → CompileChecked →
//! TypeChecked` and ends `Passed` or `Failed`. Only a fatal syntax error
//! stops the walk early; compile errors never hide typecheck results.

pub mod compile;
pub mod process;
pub mod syntax;
pub mod typecheck;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ValidationConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
use crate::emit::RenderedFiles;
use crate::error::ValidateError;

pub use compile::{Compiler, CompilerKind};
pub use typecheck::TypecheckInput;

/// Where a report is in the tier sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationState {
    Unvalidated,
    SyntaxChecked,
    CompileChecked,
    TypeChecked,
    Passed,
    Failed,
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationState::Unvalidated => "unvalidated",
            ValidationState::SyntaxChecked => "syntax-checked",
            ValidationState::CompileChecked => "compile-checked",
            ValidationState::TypeChecked => "type-checked",
            ValidationState::Passed => "passed",
            ValidationState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of a single tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TierStatus {
    NotRun,
    Passed,
    Failed,
    Skipped(String),
}

impl fmt::Display for TierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierStatus::NotRun => f.write_str("not run"),
            TierStatus::Passed => f.write_str("passed"),
            TierStatus::Failed => f.write_str("failed"),
            TierStatus::Skipped(reason) => write!(f, "skipped ({reason})"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub state: ValidationState,
    pub syntax: TierStatus,
    pub compile: TierStatus,
    pub typecheck: TierStatus,
    pub diagnostics: Diagnostics,
}

impl Default for ValidationReport {
    fn default() -> Self {
        ValidationReport {
            state: ValidationState::Unvalidated,
            syntax: TierStatus::NotRun,
            compile: TierStatus::NotRun,
            typecheck: TierStatus::NotRun,
            diagnostics: Diagnostics::new(),
        }
    }
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.state == ValidationState::Passed
    }

    /// True once the syntax tier found unbalanced delimiters.
    pub fn is_syntax_fatal(&self) -> bool {
        self.diagnostics.count(DiagnosticKind::SyntaxFatal) > 0
    }

    /// Closes the report. A failed typecheck is advisory: it only fails the
    /// run through error-severity diagnostics.
    fn finish(&mut self) {
        let failed = self.syntax == TierStatus::Failed
            || self.compile == TierStatus::Failed
            || self.diagnostics.has_errors();
        self.state = if failed {
            ValidationState::Failed
        } else {
            ValidationState::Passed
        };
    }
}

/// Runs the syntax tier over every rendered file.
pub fn check_syntax(files: &RenderedFiles) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (name, source) in files {
        report.diagnostics.extend(syntax::check_source(name, source));
    }
    if report.is_syntax_fatal() {
        report.syntax = TierStatus::Failed;
        report.state = ValidationState::Failed;
    } else {
        report.syntax = TierStatus::Passed;
        report.state = ValidationState::SyntaxChecked;
    }
    report
}

/// Per-run switches layered over the `[validation]` config.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    pub skip_compile: bool,
    pub skip_typecheck: bool,
    /// Overrides `validation.require_tools` when set.
    pub require_tools: Option<bool>,
}

/// Drives the external tiers.
pub struct Validator<'a> {
    config: &'a ValidationConfig,
    options: ValidationOptions,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a ValidationConfig, options: ValidationOptions) -> Self {
        Validator {
            config,
            options,
            cancel: None,
        }
    }

    /// Checked between tiers; a set flag aborts with
    /// [`ValidateError::Cancelled`].
    pub fn with_cancel_flag(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn require_tools(&self) -> bool {
        self.options
            .require_tools
            .unwrap_or_else(|| self.config.require_tools())
    }

    fn check_cancelled(&self) -> Result<(), ValidateError> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ValidateError::Cancelled),
            _ => Ok(()),
        }
    }

    fn tool_missing(&self, report: &mut ValidationReport, tool: &str) -> TierStatus {
        let mut diagnostic = Diagnostic::new(
            DiagnosticKind::ToolUnavailable,
            format!("{tool} not found on PATH"),
        );
        if self.require_tools() {
            diagnostic = diagnostic.with_severity(Severity::Error);
            report.diagnostics.push(diagnostic);
            TierStatus::Failed
        } else {
            warn!("{tool} not found; skipping tier");
            report.diagnostics.push(diagnostic);
            TierStatus::Skipped(format!("{tool} not found"))
        }
    }

    /// Runs the remaining tiers. An unvalidated report is syntax-checked
    /// first; a syntax-fatal report comes back failed without touching any
    /// external tool.
    pub fn run(
        &self,
        mut report: ValidationReport,
        files: &RenderedFiles,
        typings: Option<&TypecheckInput>,
    ) -> Result<ValidationReport, ValidateError> {
        if report.state == ValidationState::Unvalidated {
            let syntax = check_syntax(files);
            report.diagnostics.extend(syntax.diagnostics);
            report.syntax = syntax.syntax;
            report.state = syntax.state;
        }
        if report.is_syntax_fatal() {
            report.state = ValidationState::Failed;
            return Ok(report);
        }

        self.check_cancelled()?;
        report.compile = if self.options.skip_compile {
            TierStatus::Skipped("disabled".to_string())
        } else {
            match Compiler::locate(self.config) {
                Some(compiler) => match compile::compile(&compiler, files, self.config) {
                    Ok(run) => {
                        info!(passed = run.passed, errors = run.diagnostics.len(), "compile tier done");
                        report.diagnostics.extend(run.diagnostics);
                        if run.passed {
                            TierStatus::Passed
                        } else {
                            TierStatus::Failed
                        }
                    }
                    Err(err) => {
                        report
                            .diagnostics
                            .push(tier_error(DiagnosticKind::CompileFailure, err)?);
                        TierStatus::Failed
                    }
                },
                None => self.tool_missing(&mut report, "C# compiler (mcs, csc or dotnet)"),
            }
        };
        report.state = ValidationState::CompileChecked;

        self.check_cancelled()?;
        report.typecheck = match (self.options.skip_typecheck, typings) {
            (true, _) => TierStatus::Skipped("disabled".to_string()),
            (false, None) => TierStatus::Skipped("no declaration sources".to_string()),
            (false, Some(input)) => match typecheck::locate_tsc(self.config) {
                Some(tsc) => {
                    let run = match typecheck::typecheck(&tsc, input, self.config) {
                        Ok(run) => run,
                        Err(err) => {
                            let mut diagnostics = Diagnostics::new();
                            diagnostics.push(tier_error(DiagnosticKind::TypeCheckFailure, err)?);
                            typecheck::TypecheckRun {
                                passed: false,
                                diagnostics,
                            }
                        }
                    };
                    info!(passed = run.passed, errors = run.diagnostics.len(), "typecheck tier done");
                    let blocking = self.config.typecheck_blocking();
                    for diagnostic in run.diagnostics {
                        report.diagnostics.push(if blocking {
                            diagnostic.with_severity(Severity::Error)
                        } else {
                            diagnostic
                        });
                    }
                    if run.passed {
                        TierStatus::Passed
                    } else {
                        TierStatus::Failed
                    }
                }
                None => self.tool_missing(&mut report, "tsc"),
            },
        };
        report.state = ValidationState::TypeChecked;

        report.finish();
        Ok(report)
    }
}

/// A tool that was found but could not run fails its own tier only.
/// Cancellation still aborts the walk.
fn tier_error(kind: DiagnosticKind, err: ValidateError) -> Result<Diagnostic, ValidateError> {
    match err {
        ValidateError::Cancelled => Err(err),
        err => {
            warn!(error = %err, %kind, "validation tool could not run");
            Ok(Diagnostic::new(kind, err.to_string()))
        }
    }
}

/// Severity printed by a compiler or `tsc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ToolSeverity {
    Error,
    Warning,
}

/// One `file(line,col): error CODE: message` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ToolLine {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub severity: ToolSeverity,
    pub code: String,
    pub message: String,
}

/// Parses the MSBuild-style diagnostic format shared by `mcs`, `csc`,
/// `dotnet build` and `tsc --pretty false`.
pub(crate) fn parse_tool_line(line: &str) -> Option<ToolLine> {
    let line = line.trim();
    let (location, rest) = line.split_once("): ")?;
    let open = location.rfind('(')?;
    let file = &location[..open];
    let (row, col) = location[open + 1..].split_once(',')?;
    let row = row.trim().parse().ok()?;
    let column = col.trim().parse().ok()?;

    let (severity, rest) = if let Some(rest) = rest.strip_prefix("error ") {
        (ToolSeverity::Error, rest)
    } else if let Some(rest) = rest.strip_prefix("warning ") {
        (ToolSeverity::Warning, rest)
    } else {
        return None;
    };
    let (code, message) = rest.split_once(": ")?;

    // `dotnet build` appends the project path in brackets.
    let message = match message.rfind(" [") {
        Some(at) if message.ends_with(".csproj]") => &message[..at],
        _ => message,
    };

    Some(ToolLine {
        file: file.trim().to_string(),
        line: row,
        column,
        severity,
        code: code.trim().to_string(),
        message: message.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mcs_errors() {
        let line = "src/AIT.Device.cs(12,17): error CS0103: The name `foo' does not exist in the current context";
        let parsed = parse_tool_line(line).unwrap();
        assert_eq!(parsed.file, "src/AIT.Device.cs");
        assert_eq!((parsed.line, parsed.column), (12, 17));
        assert_eq!(parsed.severity, ToolSeverity::Error);
        assert_eq!(parsed.code, "CS0103");
        assert!(parsed.message.starts_with("The name"));
    }

    #[test]
    fn parses_dotnet_errors_without_project_suffix() {
        let line = "/tmp/x/src/AIT.cs(3,5): error CS1002: ; expected [/tmp/x/BridgeStubs.csproj]";
        let parsed = parse_tool_line(line).unwrap();
        assert_eq!(parsed.message, "; expected");
    }

    #[test]
    fn parses_tsc_errors() {
        let line = "bridge-check.ts(4,3): error TS2345: Argument of type 'string' is not assignable to parameter of type 'number'.";
        let parsed = parse_tool_line(line).unwrap();
        assert_eq!(parsed.code, "TS2345");
        assert_eq!(parsed.line, 4);
    }

    #[test]
    fn parses_warnings_and_ignores_noise() {
        let warning = parse_tool_line("a.cs(1,1): warning CS0168: unused").unwrap();
        assert_eq!(warning.severity, ToolSeverity::Warning);
        assert!(parse_tool_line("Compilation failed: 1 error(s), 0 warnings").is_none());
        assert!(parse_tool_line("").is_none());
    }

    #[test]
    fn syntax_fatal_stops_before_external_tiers() {
        let mut files = RenderedFiles::new();
        files.insert("AIT.Broken.cs".to_string(), "class A {\n".to_string());
        let config = ValidationConfig::default();
        let report = Validator::new(&config, ValidationOptions::default())
            .run(ValidationReport::default(), &files, None)
            .unwrap();
        assert_eq!(report.state, ValidationState::Failed);
        assert_eq!(report.syntax, TierStatus::Failed);
        assert_eq!(report.compile, TierStatus::NotRun);
        assert_eq!(report.typecheck, TierStatus::NotRun);
    }

    #[test]
    fn skipped_tiers_still_pass() {
        let mut files = RenderedFiles::new();
        files.insert("AIT.cs".to_string(), "class A {}\n".to_string());
        let config = ValidationConfig::default();
        let options = ValidationOptions {
            skip_compile: true,
            skip_typecheck: true,
            require_tools: None,
        };
        let report = Validator::new(&config, options)
            .run(ValidationReport::default(), &files, None)
            .unwrap();
        assert_eq!(report.state, ValidationState::Passed);
        assert!(matches!(report.compile, TierStatus::Skipped(_)));
        assert!(matches!(report.typecheck, TierStatus::Skipped(_)));
    }

    #[test]
    fn cancellation_is_checked_between_tiers() {
        let files = RenderedFiles::new();
        let config = ValidationConfig::default();
        let cancel = AtomicBool::new(true);
        let err = Validator::new(&config, ValidationOptions::default())
            .with_cancel_flag(&cancel)
            .run(ValidationReport::default(), &files, None)
            .unwrap_err();
        assert!(matches!(err, ValidateError::Cancelled));
    }

    #[cfg(unix)]
    #[test]
    fn unrunnable_tools_fail_their_tier_and_keep_going() {
        use std::os::unix::fs::PermissionsExt;

        // Executable, so it is located, but its interpreter does not exist.
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("mcs");
        std::fs::write(&tool, "#!/nonexistent/bridgegen-interpreter\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        let tool = tool.display().to_string();

        let config = ValidationConfig {
            compiler: Some(tool.clone()),
            tsc: Some(tool),
            ..ValidationConfig::default()
        };
        let mut files = RenderedFiles::new();
        files.insert("AIT.cs".to_string(), "class A {}\n".to_string());
        let input = TypecheckInput {
            typings: String::new(),
            sources: Vec::new(),
        };

        let report = Validator::new(&config, ValidationOptions::default())
            .run(ValidationReport::default(), &files, Some(&input))
            .unwrap();
        assert_eq!(report.compile, TierStatus::Failed);
        assert_eq!(report.typecheck, TierStatus::Failed);
        assert_eq!(report.state, ValidationState::Failed);
        let failure = report
            .diagnostics
            .of_kind(DiagnosticKind::CompileFailure)
            .next()
            .unwrap();
        assert!(failure.message.contains("failed to run"), "{failure}");
        assert_eq!(report.diagnostics.count(DiagnosticKind::TypeCheckFailure), 1);
    }

    #[test]
    fn missing_tools_fail_only_when_required() {
        let config = ValidationConfig {
            compiler: Some("/nonexistent/bridgegen-csc".to_string()),
            tsc: Some("/nonexistent/bridgegen-tsc".to_string()),
            ..ValidationConfig::default()
        };
        let files = RenderedFiles::new();
        let input = TypecheckInput {
            typings: String::new(),
            sources: Vec::new(),
        };

        let lenient = Validator::new(&config, ValidationOptions::default())
            .run(ValidationReport::default(), &files, Some(&input))
            .unwrap();
        assert_eq!(lenient.state, ValidationState::Passed);
        assert_eq!(lenient.diagnostics.count(DiagnosticKind::ToolUnavailable), 2);

        let strict = Validator::new(
            &config,
            ValidationOptions {
                require_tools: Some(true),
                ..ValidationOptions::default()
            },
        )
        .run(ValidationReport::default(), &files, Some(&input))
        .unwrap();
        assert_eq!(strict.state, ValidationState::Failed);
        assert_eq!(strict.compile, TierStatus::Failed);
    }
}
