//! Diagnostics accumulated across a run.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What went wrong, by pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// A declaration matched no classification rule and was emitted as a
    /// plain function.
    ParseAmbiguity,
    /// A type could not be mapped and degraded to `object`.
    TypeMappingFallback,
    SyntaxWarning,
    /// Unbalanced braces or parentheses in generated code.
    SyntaxFatal,
    CompileFailure,
    TypeCheckFailure,
    /// A declaration file failed to parse and was skipped.
    ParseError,
    /// A compiler or `tsc` could not be located.
    ToolUnavailable,
    /// An API name already produced for the same category; the later
    /// declaration is skipped.
    DuplicateApi,
    /// Several declaration files share a stem and render into one category.
    CategoryMerged,
}

impl DiagnosticKind {
    /// Default severity for the kind.
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::SyntaxFatal | DiagnosticKind::CompileFailure => Severity::Error,
            DiagnosticKind::ParseAmbiguity
            | DiagnosticKind::TypeMappingFallback
            | DiagnosticKind::SyntaxWarning
            | DiagnosticKind::TypeCheckFailure
            | DiagnosticKind::ParseError
            | DiagnosticKind::ToolUnavailable
            | DiagnosticKind::DuplicateApi => Severity::Warning,
            DiagnosticKind::CategoryMerged => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::ParseAmbiguity => "parse-ambiguity",
            DiagnosticKind::TypeMappingFallback => "type-fallback",
            DiagnosticKind::SyntaxWarning => "syntax-warning",
            DiagnosticKind::SyntaxFatal => "syntax-fatal",
            DiagnosticKind::CompileFailure => "compile",
            DiagnosticKind::TypeCheckFailure => "typecheck",
            DiagnosticKind::ParseError => "parse-error",
            DiagnosticKind::ToolUnavailable => "tool-unavailable",
            DiagnosticKind::DuplicateApi => "duplicate-api",
            DiagnosticKind::CategoryMerged => "category-merge",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Diagnostic code reported by an external tool (`CS0103`, `TS2345`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// The API the diagnostic concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            file: None,
            line: None,
            column: None,
            code: None,
            api: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
            if let (Some(line), Some(column)) = (self.line, self.column) {
                write!(f, "({line},{column})")?;
            }
            f.write_str(": ")?;
        }
        write!(f, "[{}] ", self.kind)?;
        if let Some(code) = &self.code {
            write!(f, "{code}: ")?;
        }
        f.write_str(&self.message)?;
        if let Some(api) = &self.api {
            write!(f, " (api `{api}`)")?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(kind = %diagnostic.kind, "{}", diagnostic.message);
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location_and_code() {
        let d = Diagnostic::new(DiagnosticKind::CompileFailure, "name does not exist")
            .with_file("AIT.Device.cs")
            .at(12, 5)
            .with_code("CS0103");
        assert_eq!(
            d.to_string(),
            "AIT.Device.cs(12,5): [compile] CS0103: name does not exist"
        );
        assert!(d.is_error());
    }

    #[test]
    fn severity_follows_kind() {
        assert_eq!(DiagnosticKind::SyntaxFatal.severity(), Severity::Error);
        assert_eq!(DiagnosticKind::TypeCheckFailure.severity(), Severity::Warning);
        let blocking = Diagnostic::new(DiagnosticKind::TypeCheckFailure, "x")
            .with_severity(Severity::Error);
        assert!(blocking.is_error());
    }

    #[test]
    fn collection_counts_by_kind() {
        let mut all = Diagnostics::new();
        all.push(Diagnostic::new(DiagnosticKind::SyntaxWarning, "a"));
        all.push(Diagnostic::new(DiagnosticKind::SyntaxWarning, "b"));
        all.push(Diagnostic::new(DiagnosticKind::ParseAmbiguity, "c"));
        assert_eq!(all.count(DiagnosticKind::SyntaxWarning), 2);
        assert!(!all.has_errors());
    }
}
