//! Error types for the generator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering and reading declaration files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input path does not exist or is not a directory.
    #[error("input directory not found: {0}")]
    MissingInput(PathBuf),

    /// Walking the input tree failed.
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// I/O error reading a declaration file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while rendering output files.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Two categories map to the same output file name.
    #[error("categories `{first}` and `{second}` both render to `{file}`")]
    CategoryCollision {
        first: String,
        second: String,
        file: String,
    },

    /// Two categories declare APIs rendering to the same method.
    #[error("method `{method}` is declared by both `{first}` and `{second}`")]
    DuplicateMethod {
        method: String,
        first: String,
        second: String,
    },

    /// A template failed to render.
    #[error("template `{template}` failed: {message}")]
    Template { template: String, message: String },
}

impl EmitError {
    pub(crate) fn template(template: &str, err: tera::Error) -> Self {
        // Tera nests the useful message in the source chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        EmitError::Template {
            template: template.to_string(),
            message,
        }
    }
}

/// Errors raised by the validation tiers themselves, as opposed to
/// diagnostics about the generated code.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// Spawning or waiting for an external tool failed.
    #[error("failed to run `{tool}`: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool exceeded its time budget and was killed.
    #[error("`{tool}` timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// I/O error preparing a validation workspace.
    #[error("I/O error in validation workspace: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled between tiers.
    #[error("validation cancelled")]
    Cancelled,
}

/// Errors loading `bridgegen.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    /// Writing an output file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
