//! Colored reporting of diagnostics and validation results on stderr.

use std::io::{self, Write};

use bridgegen_core::{Diagnostic, Diagnostics, Severity, TierStatus, ValidationReport};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Colors only when stderr is a terminal.
fn color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

pub struct Reporter {
    stream: StandardStream,
}

impl Reporter {
    pub fn stderr() -> Self {
        Reporter {
            stream: StandardStream::stderr(color_choice()),
        }
    }

    fn label(&mut self, text: &str, color: Color) -> io::Result<()> {
        self.stream
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(self.stream, "{text}")?;
        self.stream.reset()
    }

    pub fn diagnostic(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        match diagnostic.severity {
            Severity::Error => self.label("error", Color::Red)?,
            Severity::Warning => self.label("warning", Color::Yellow)?,
            Severity::Info => self.label("info", Color::Cyan)?,
        }
        writeln!(self.stream, ": {diagnostic}")
    }

    pub fn diagnostics(&mut self, diagnostics: &Diagnostics) -> io::Result<()> {
        for diagnostic in diagnostics {
            self.diagnostic(diagnostic)?;
        }
        Ok(())
    }

    fn tier(&mut self, name: &str, status: &TierStatus) -> io::Result<()> {
        write!(self.stream, "  {name:<10}")?;
        let color = match status {
            TierStatus::Passed => Color::Green,
            TierStatus::Failed => Color::Red,
            TierStatus::Skipped(_) => Color::Yellow,
            TierStatus::NotRun => Color::White,
        };
        self.label(&status.to_string(), color)?;
        writeln!(self.stream)
    }

    /// Diagnostics followed by one line per tier and the final state.
    pub fn report(&mut self, report: &ValidationReport) -> io::Result<()> {
        self.diagnostics(&report.diagnostics)?;
        writeln!(self.stream, "validation:")?;
        self.tier("syntax", &report.syntax)?;
        self.tier("compile", &report.compile)?;
        self.tier("typecheck", &report.typecheck)?;
        if report.passed() {
            self.label("passed", Color::Green)?;
        } else {
            self.label(&report.state.to_string(), Color::Red)?;
        }
        writeln!(self.stream)
    }

    /// Prints a fatal error with its cause chain.
    pub fn error(&mut self, err: &anyhow::Error) -> io::Result<()> {
        self.label("error", Color::Red)?;
        writeln!(self.stream, ": {err}")?;
        for cause in err.chain().skip(1) {
            writeln!(self.stream, "  caused by: {cause}")?;
        }
        Ok(())
    }
}
