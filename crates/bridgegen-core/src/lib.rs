//! Generates Unity C# stubs and Emscripten glue from TypeScript bridge
//! declarations, and validates what it generates.
//!
//! The stages run in order and each produces plain data for the next:
//! [`loader`] parses the declaration tree, [`extract`] classifies
//! declarations into [`ir::ParsedAPI`]s through the [`mapper`], [`emit`]
//! renders the output files and [`validate`] checks them.

pub mod categorize;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod extract;
pub mod ir;
pub mod loader;
pub mod mapper;
pub mod pipeline;
pub mod resolver;
pub mod typedefs;
pub mod validate;

pub use config::BridgegenConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{ConfigError, EmitError, LoadError, PipelineError, ValidateError};
pub use pipeline::{Analysis, GenerateOptions, GenerateOutcome, Pipeline};
pub use validate::{TierStatus, ValidationOptions, ValidationReport, ValidationState};
