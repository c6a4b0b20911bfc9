//! Generator configuration (bridgegen.toml) parsing and types.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name looked up in the working and home directories.
pub const CONFIG_FILE_NAME: &str = "bridgegen.toml";

/// Smallest timeout accepted for an external tool.
pub const MIN_TIMEOUT_SECS: u64 = 10;

/// Root configuration structure for bridgegen.toml.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BridgegenConfig {
    /// Naming of the generated code.
    #[serde(default)]
    pub output: OutputConfig,
    /// Input discovery and filtering.
    #[serde(default)]
    pub input: InputConfig,
    /// Compile and typecheck tiers.
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    /// C# namespace of the generated code.
    pub namespace: Option<String>,
    /// Name of the static partial class holding every API.
    pub class_name: Option<String>,
    /// Prefix of the glue file names (`{prefix}-{Category}.jslib`).
    pub glue_prefix: Option<String>,
    /// JavaScript expression that holds the bridge library at runtime.
    pub bridge_global: Option<String>,
    /// Version tag of the bridge library, stamped into file headers.
    pub sdk_tag: Option<String>,
}

/// `[input]` section.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct InputConfig {
    /// File names never treated as API sources.
    pub skip_files: Option<Vec<String>>,
    /// API names (camelCase or dotted original names) to leave out.
    pub exclude_apis: Option<Vec<String>>,
}

/// `[validation]` section.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ValidationConfig {
    /// Seconds before the C# compiler is killed.
    pub compile_timeout_secs: Option<u64>,
    /// Seconds before `tsc` is killed.
    pub typecheck_timeout_secs: Option<u64>,
    /// Explicit compiler: `csc`, `mcs`, `dotnet` or a path.
    pub compiler: Option<String>,
    /// Reference assemblies passed to the compiler.
    pub references: Option<Vec<String>>,
    /// Compile against the bundled UnityEngine/Newtonsoft stubs when no
    /// references are configured.
    pub use_stubs: Option<bool>,
    /// Extra ambient `.d.ts` files copied into the typecheck workspace.
    pub ambient_declarations: Option<Vec<String>>,
    /// Explicit `tsc` executable.
    pub tsc: Option<String>,
    /// Treat a missing compiler or `tsc` as a failure.
    pub require_tools: Option<bool>,
    /// Let typecheck errors fail the run.
    pub typecheck_blocking: Option<bool>,
}

impl BridgegenConfig {
    /// Load configuration from bridgegen.toml in the current directory.
    /// Returns None if the file doesn't exist.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_FILE_NAME))
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolve configuration: an explicit path must exist; otherwise
    /// `./bridgegen.toml`, then `~/.bridgegen.toml`, then defaults.
    pub fn discover(
        explicit: Option<&Path>,
        home: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_path(path)?.ok_or_else(|| ConfigError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })?;
            return Ok((config, Some(path.to_path_buf())));
        }

        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(home) = home {
            candidates.push(home.join(format!(".{CONFIG_FILE_NAME}")));
        }
        for candidate in candidates {
            if let Some(config) = Self::load_from_path(&candidate)? {
                return Ok((config, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }
}

impl OutputConfig {
    /// C# namespace (default: "AppsInToss").
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("AppsInToss")
    }

    /// Partial class name (default: "AIT").
    pub fn class_name(&self) -> &str {
        self.class_name.as_deref().unwrap_or("AIT")
    }

    /// Glue file prefix (default: "AppsInToss").
    pub fn glue_prefix(&self) -> &str {
        self.glue_prefix.as_deref().unwrap_or("AppsInToss")
    }

    /// Bridge global expression (default: "window.AppsInToss").
    pub fn bridge_global(&self) -> &str {
        self.bridge_global.as_deref().unwrap_or("window.AppsInToss")
    }

    /// SDK tag (default: "unknown").
    pub fn sdk_tag(&self) -> &str {
        self.sdk_tag.as_deref().unwrap_or("unknown")
    }
}

impl InputConfig {
    /// Skipped file names (default: types.d.ts, bridge.d.ts).
    pub fn skip_files(&self) -> Vec<String> {
        self.skip_files
            .clone()
            .unwrap_or_else(|| vec!["types.d.ts".to_string(), "bridge.d.ts".to_string()])
    }

    /// Excluded API names (default: none).
    pub fn exclude_apis(&self) -> &[String] {
        self.exclude_apis.as_deref().unwrap_or(&[])
    }
}

impl ValidationConfig {
    fn clamp(secs: Option<u64>) -> Duration {
        Duration::from_secs(secs.unwrap_or(60).max(MIN_TIMEOUT_SECS))
    }

    /// Compile tier budget (default 60s, at least 10s).
    pub fn compile_timeout(&self) -> Duration {
        Self::clamp(self.compile_timeout_secs)
    }

    /// Typecheck tier budget (default 60s, at least 10s).
    pub fn typecheck_timeout(&self) -> Duration {
        Self::clamp(self.typecheck_timeout_secs)
    }

    pub fn references(&self) -> &[String] {
        self.references.as_deref().unwrap_or(&[])
    }

    /// Whether to compile against bundled stubs (default: true when no
    /// references are configured).
    pub fn use_stubs(&self) -> bool {
        self.use_stubs.unwrap_or(self.references().is_empty())
    }

    pub fn ambient_declarations(&self) -> &[String] {
        self.ambient_declarations.as_deref().unwrap_or(&[])
    }

    /// Missing tools fail the run (default: false).
    pub fn require_tools(&self) -> bool {
        self.require_tools.unwrap_or(false)
    }

    /// Typecheck errors fail the run (default: false).
    pub fn typecheck_blocking(&self) -> bool {
        self.typecheck_blocking.unwrap_or(false)
    }
}
