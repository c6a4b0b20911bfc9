//! Structural checks over generated sources.
//!
//! Brace and paren balance is fatal. Everything else is a heuristic and
//! only warns.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};

/// Kind of generated file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    CSharp,
    Jslib,
    TypeScript,
}

impl SourceKind {
    pub fn of(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext {
            "cs" => Some(SourceKind::CSharp),
            "jslib" | "js" => Some(SourceKind::Jslib),
            "ts" => Some(SourceKind::TypeScript),
            _ => None,
        }
    }
}

/// Opening and closing counts, outside string literals and comments.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub open_braces: usize,
    pub close_braces: usize,
    pub open_parens: usize,
    pub close_parens: usize,
}

impl Balance {
    pub fn is_balanced(&self) -> bool {
        self.open_braces == self.close_braces && self.open_parens == self.close_parens
    }
}

/// Counts delimiters, skipping comments and string literals.
///
/// Handles `"..."`, `'...'`, template literals, C# verbatim strings
/// (`@"..."` with `""` escapes), `//` line comments and `/* */` blocks.
pub fn count_delimiters(source: &str) -> Balance {
    let mut balance = Balance::default();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '@' if chars.peek() == Some(&'"') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '"' {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
            }
            '"' | '\'' | '`' => {
                let quote = c;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        // Unterminated ordinary literals stop at the line end.
                        '\n' if quote != '`' => break,
                        c if c == quote => break,
                        _ => {}
                    }
                }
            }
            '{' => balance.open_braces += 1,
            '}' => balance.close_braces += 1,
            '(' => balance.open_parens += 1,
            ')' => balance.close_parens += 1,
            _ => {}
        }
    }
    balance
}

/// Runs every check on one file.
pub fn check_source(file_name: &str, source: &str) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    let Some(kind) = SourceKind::of(file_name) else {
        return diagnostics;
    };

    let balance = count_delimiters(source);
    if balance.open_braces != balance.close_braces {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::SyntaxFatal,
                format!(
                    "unbalanced braces: {} opening, {} closing",
                    balance.open_braces, balance.close_braces
                ),
            )
            .with_file(file_name),
        );
    }
    if balance.open_parens != balance.close_parens {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::SyntaxFatal,
                format!(
                    "unbalanced parentheses: {} opening, {} closing",
                    balance.open_parens, balance.close_parens
                ),
            )
            .with_file(file_name),
        );
    }

    match kind {
        SourceKind::CSharp => {
            if !source.contains("[DllImport(\"__Internal\")]") && !source.contains("class ") {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::SyntaxWarning,
                        "C# file declares neither an extern binding nor a class",
                    )
                    .with_file(file_name),
                );
            }
        }
        SourceKind::Jslib => {
            if source.contains("mergeInto(LibraryManager.library") && !source.contains("autoAddDeps(") {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::SyntaxWarning,
                        "library is merged without autoAddDeps; `$` dependencies will be dropped",
                    )
                    .with_file(file_name),
                );
            }
        }
        SourceKind::TypeScript => {}
    }

    if let Some(line) = missing_terminator(source) {
        diagnostics.push(
            Diagnostic::new(DiagnosticKind::SyntaxWarning, "statement may be missing a terminator")
                .with_file(file_name)
                .at(line, 1),
        );
    }
    diagnostics
}

/// One-based line of the first statement-like line with no terminator.
fn missing_terminator(source: &str) -> Option<usize> {
    let lines: Vec<&str> = source.lines().map(str::trim).collect();
    let mut in_block_comment = false;

    for (i, line) in lines.iter().enumerate() {
        if in_block_comment {
            in_block_comment = !line.contains("*/");
            continue;
        }
        if line.starts_with("/*") {
            in_block_comment = !line.contains("*/");
            continue;
        }
        if line.is_empty()
            || line.starts_with("//")
            || line.starts_with('*')
            || line.starts_with('[')
            || line.starts_with('#')
            || line.contains("=>")
        {
            continue;
        }
        if ends_statement(line) || !(line.contains('(') || line.contains('=')) {
            continue;
        }

        // Declaration headers and the last member of a literal.
        let next = lines[i + 1..].iter().find(|l| !l.is_empty());
        if next.is_some_and(|n| n.starts_with('{') || n.starts_with('}') || n.starts_with(')') || n.starts_with('.')) {
            continue;
        }
        return Some(i + 1);
    }
    None
}

fn ends_statement(line: &str) -> bool {
    const ENDINGS: &[&str] = &[";", "{", "}", ",", "(", "[", "&&", "||", "+", "?", ":"];
    ENDINGS.iter().any(|end| line.ends_with(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_and_comments_do_not_count() {
        let src = r#"
var a = "{";
var b = '(';
// }
/* ) */
var c = `}${x}`;
var d = @"say ""{"" ";
function f() { return g(1); }
"#;
        let balance = count_delimiters(src);
        assert!(balance.is_balanced(), "{balance:?}");
        assert_eq!(balance.open_braces, 1);
        assert_eq!(balance.open_parens, 2);
    }

    #[test]
    fn extra_brace_is_fatal() {
        let diags = check_source("AIT.Device.cs", "class A {\n  void F() {\n  }\n");
        assert_eq!(diags.count(DiagnosticKind::SyntaxFatal), 1);
        assert!(diags.has_errors());
    }

    #[test]
    fn extra_paren_is_fatal() {
        let diags = check_source("AppsInToss-Device.jslib", "var x = f((1);\n");
        assert_eq!(diags.count(DiagnosticKind::SyntaxFatal), 1);
    }

    #[test]
    fn csharp_without_class_or_extern_warns() {
        let diags = check_source("AIT.Empty.cs", "namespace A\n{\n}\n");
        assert_eq!(diags.count(DiagnosticKind::SyntaxWarning), 1);
        assert!(!diags.has_errors());
    }

    #[test]
    fn merge_without_auto_add_deps_warns() {
        let src = "var L = {};\nmergeInto(LibraryManager.library, L);\n";
        let diags = check_source("AppsInToss-X.jslib", src);
        assert_eq!(diags.count(DiagnosticKind::SyntaxWarning), 1);
    }

    #[test]
    fn only_the_first_missing_terminator_is_reported() {
        let src = "var a = f(1)\nvar b = g(2)\n";
        let diags = check_source("x.jslib", src);
        let warnings: Vec<_> = diags.of_kind(DiagnosticKind::SyntaxWarning).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, Some(1));
    }

    #[test]
    fn headers_and_literal_tails_are_not_statements() {
        let src = "\
public static double Ratio(int x)
{
    return Compute(
        x,
        y);
}
var o = {
  Error: AIT.message(error)
};
Promise.resolve(x)
  .then(done);
";
        assert!(missing_terminator(src).is_none());
    }

    #[test]
    fn unknown_extensions_are_ignored() {
        assert!(check_source("README.md", "{{{").is_empty());
    }
}
