//! Tool descriptors and the declarative manifest that lists them.
//!
//! A manifest is a JSON document (`schemas/v1/manifest.json`) describing every
//! external tool linthub knows how to drive: when it applies, how it is
//! invoked, which parser understands its output and which tools it cannot
//! coexist with. Descriptors are plain data and carry no behavior beyond a few
//! accessors.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use globset::Glob;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Placeholder in argument templates that expands to the target paths.
pub const PATHS_PLACEHOLDER: &str = "{paths}";

/// Placeholder in option templates that expands to the option value.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Timeout used when a descriptor does not declare one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for manifest operations.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Manifest validation failed: {0}")]
    ValidationError(String),
    #[error("Invalid manifest: {0}")]
    Invalid(String),
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which output parser understands a tool's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    Ruff,
    Shellcheck,
    Tsc,
    Astro,
    Mypy,
    Clippy,
    Prettier,
    Black,
    Rustfmt,
    /// Generic `file:line[:col]: message` output.
    Colon,
}

/// Program and argument templates for each mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub check_args: Vec<String>,
    #[serde(default)]
    pub fix_args: Vec<String>,
}

/// A project-level precondition such as `package.json` -> `node_modules`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySpec {
    /// File whose presence means the project declares dependencies.
    pub manifest: String,
    /// Directory that must be populated before the tool can run.
    pub install_dir: String,
}

/// Static description of one external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lower values run and display first.
    pub priority: i32,
    #[serde(default = "default_true")]
    pub can_check: bool,
    #[serde(default)]
    pub can_fix: bool,
    #[serde(default)]
    pub conflicts_with: Vec<String>,
    pub file_patterns: Vec<String>,
    #[serde(default = "default_timeout")]
    pub default_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    pub command: ToolCommand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_command: Option<Vec<String>>,
    pub parser: ParserKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<DependencySpec>,
    /// Option name to argument template, e.g. `"select" -> "--select={value}"`.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ToolDescriptor {
    /// Returns true if this descriptor declares a conflict with `other`.
    pub fn declares_conflict(&self, other: &str) -> bool {
        self.conflicts_with.iter().any(|name| name == other)
    }

    /// Returns the argument template for the given mode.
    pub fn args_template(&self, fix: bool) -> &[String] {
        if fix {
            &self.command.fix_args
        } else {
            &self.command.check_args
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout)
    }
}

/// The structure of a tool manifest file.
/// This matches `schemas/v1/manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolManifest {
    pub version: u32,
    pub tools: Vec<ToolDescriptor>,
}

// Path is relative to this file: ../../../schemas/v1/manifest.json
const MANIFEST_SCHEMA_JSON: &str = include_str!("../../../schemas/v1/manifest.json");

const BUILTIN_MANIFEST_JSON: &str = include_str!("../../../manifest/tools.json");

static SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

fn schema() -> Result<&'static Validator, ManifestError> {
    SCHEMA
        .get_or_init(|| {
            let schema_json: Value =
                serde_json::from_str(MANIFEST_SCHEMA_JSON).map_err(|e| e.to_string())?;
            Validator::new(&schema_json).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| ManifestError::ValidationError(format!("embedded schema is invalid: {e}")))
}

impl ToolManifest {
    /// Returns the manifest bundled with the binary.
    pub fn builtin() -> Result<Self, ManifestError> {
        parse_manifest(BUILTIN_MANIFEST_JSON)
    }

    /// Loads and validates a manifest from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_manifest(&content)
    }
}

/// Parses a manifest JSON string, validating it against the schema and then
/// against the rules the schema cannot express.
pub fn parse_manifest(json_str: &str) -> Result<ToolManifest, ManifestError> {
    let instance: Value = serde_json::from_str(json_str)?;

    if let Err(e) = schema()?.validate(&instance) {
        let error_msg = format!("{} at {}", e, e.instance_path());
        return Err(ManifestError::ValidationError(error_msg));
    }

    let manifest: ToolManifest = serde_json::from_value(instance)?;
    check_semantics(&manifest)?;
    Ok(manifest)
}

fn check_semantics(manifest: &ToolManifest) -> Result<(), ManifestError> {
    let mut seen = HashSet::new();
    for tool in &manifest.tools {
        if !seen.insert(tool.name.as_str()) {
            return Err(ManifestError::Invalid(format!(
                "duplicate tool name '{}'",
                tool.name
            )));
        }
        if tool.declares_conflict(&tool.name) {
            return Err(ManifestError::Invalid(format!(
                "tool '{}' conflicts with itself",
                tool.name
            )));
        }
        if !tool.can_check && !tool.can_fix {
            return Err(ManifestError::Invalid(format!(
                "tool '{}' can neither check nor fix",
                tool.name
            )));
        }
        if tool.can_fix && tool.command.fix_args.is_empty() {
            return Err(ManifestError::Invalid(format!(
                "tool '{}' can fix but declares no fix_args",
                tool.name
            )));
        }
        for pattern in &tool.file_patterns {
            Glob::new(pattern).map_err(|e| {
                ManifestError::Invalid(format!(
                    "tool '{}' has invalid file pattern {:?}: {}",
                    tool.name, pattern, e
                ))
            })?;
        }
    }
    Ok(())
}
