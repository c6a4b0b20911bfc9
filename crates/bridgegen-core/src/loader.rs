//! Declaration discovery: walks an input tree, parses every declaration
//! file and builds the project-wide symbol table the resolver reads.

use std::fs;
use std::path::{Path, PathBuf};

use bridgegen_dts::{line_col, DtsFile, DtsItem};
use indexmap::IndexMap;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::categorize::{category_of, is_declaration_file};
use crate::config::InputConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::LoadError;

/// How a file takes part in extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// Every declaration is an extraction candidate.
    Api,
    /// `index.d.ts`: only namespace objects are extracted.
    Index,
    /// Configured skip file: contributes types but no APIs.
    TypesOnly,
}

/// A parsed declaration file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the project root, `/`-separated.
    pub relative: String,
    pub category: String,
    pub role: FileRole,
    /// The file has top-level `import`/`export` and therefore its own scope.
    pub is_module: bool,
    pub ast: DtsFile,
}

impl SourceFile {
    fn new(path: PathBuf, relative: String, role: FileRole, ast: DtsFile) -> Self {
        let is_module = ast.items.iter().any(|item| {
            matches!(item, DtsItem::Import(_) | DtsItem::Export(_)) || item.is_exported()
        });
        SourceFile {
            category: category_of(&path),
            path,
            relative,
            role,
            is_module,
            ast,
        }
    }
}

/// A declaration registered in the symbol table.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Index into `Project::files`.
    pub file: usize,
    pub item: DtsItem,
}

/// All loaded files plus a name-keyed symbol table.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub root: PathBuf,
    pub files: Vec<SourceFile>,
    symbols: IndexMap<String, Vec<Symbol>>,
}

impl Project {
    /// Declarations registered under `name`, in load order. Namespace
    /// members are registered under their dotted path.
    pub fn symbols(&self, name: &str) -> &[Symbol] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn symbol_names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn file(&self, index: usize) -> Option<&SourceFile> {
        self.files.get(index)
    }

    /// Builds a project from in-memory sources. Parse failures become
    /// diagnostics, as with files on disk.
    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> (Project, Diagnostics) {
        let mut project = Project::default();
        let mut diagnostics = Diagnostics::new();
        let skip = InputConfig::default().skip_files();
        for (name, src) in sources {
            let path = PathBuf::from(name);
            let Some(role) = role_of(&path, &skip) else {
                continue;
            };
            match parse_source(&path, src) {
                Ok(ast) => project.add(SourceFile::new(path, name.to_string(), role, ast)),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }
        (project, diagnostics)
    }

    fn add(&mut self, file: SourceFile) {
        let index = self.files.len();
        register_items(&mut self.symbols, index, "", &file.ast.items);
        self.files.push(file);
    }
}

fn register_items(
    symbols: &mut IndexMap<String, Vec<Symbol>>,
    file: usize,
    prefix: &str,
    items: &[DtsItem],
) {
    for item in items {
        match item {
            DtsItem::Namespace(ns) => {
                let path = format!("{prefix}{}", ns.name);
                register_items(symbols, file, &format!("{path}."), &ns.items);
            }
            // Ambient modules and `declare global` contribute bare names.
            DtsItem::Module(module) => register_items(symbols, file, prefix, &module.items),
            DtsItem::Import(_) | DtsItem::Export(_) => {}
            other => {
                if let Some(name) = other.name() {
                    symbols
                        .entry(format!("{prefix}{name}"))
                        .or_default()
                        .push(Symbol {
                            file,
                            item: other.clone(),
                        });
                }
            }
        }
    }
}

/// Decides whether and how a file takes part, by file name alone.
fn role_of(path: &Path, skip_files: &[String]) -> Option<FileRole> {
    let file_name = path.file_name()?.to_str()?;
    if !is_declaration_file(file_name) {
        return None;
    }
    match file_name {
        // Module-format barrels only re-export.
        "index.d.mts" | "index.d.cts" => None,
        "index.d.ts" => Some(FileRole::Index),
        name if skip_files.iter().any(|skip| skip == name) => Some(FileRole::TypesOnly),
        _ => Some(FileRole::Api),
    }
}

fn parse_source(path: &Path, src: &str) -> Result<DtsFile, Diagnostic> {
    bridgegen_dts::parse(src).map_err(|err| {
        let (line, column) = line_col(src, err.pos);
        Diagnostic::new(DiagnosticKind::ParseError, err.message)
            .with_file(path)
            .at(line, column)
    })
}

/// Walks `root` recursively in sorted order and parses every declaration
/// file. Files that fail to parse are reported and left out.
pub fn load_project(root: &Path, input: &InputConfig) -> Result<(Project, Diagnostics), LoadError> {
    if !root.is_dir() {
        return Err(LoadError::MissingInput(root.to_path_buf()));
    }

    let skip = input.skip_files();
    let mut project = Project {
        root: root.to_path_buf(),
        ..Project::default()
    };
    let mut diagnostics = Diagnostics::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != "node_modules");

    for entry in walker {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(role) = role_of(path, &skip) else {
            continue;
        };

        let src = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        match parse_source(path, &src) {
            Ok(ast) => {
                debug!(file = %relative, items = ast.items.len(), ?role, "parsed declarations");
                project.add(SourceFile::new(path.to_path_buf(), relative, role, ast));
            }
            Err(diagnostic) => {
                tracing::warn!("{diagnostic}");
                diagnostics.push(diagnostic);
            }
        }
    }

    info!(
        files = project.files.len(),
        symbols = project.symbols.len(),
        "loaded declarations from {}",
        root.display()
    );
    Ok((project, diagnostics))
}
