//! Project configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use linthub_manifest::{ToolDescriptor, VALUE_PLACEHOLDER};
use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::aggregate::GroupBy;
use crate::format::OutputFormat;
use crate::install::InstallPolicy;

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

/// Option key reserved for overriding a tool's timeout from `--tool-options`.
pub const TIMEOUT_OPTION: &str = "timeout";

/// Configuration for a linthub invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tool manifest replacing the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,

    /// When present, only these tools may run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,

    /// Tools that never run.
    #[serde(default)]
    pub disabled: Vec<String>,

    /// File patterns to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Install missing dependencies before running tools.
    /// `None` defers to the environment (enabled inside containers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_install: Option<bool>,

    /// Maximum number of tools running at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,

    /// Per-tool timeout overrides in seconds.
    #[serde(default)]
    pub timeouts: BTreeMap<String, u64>,

    /// Per-tool options, expanded through the descriptor's option templates.
    #[serde(default)]
    pub tool_options: BTreeMap<String, BTreeMap<String, OptionValue>>,

    /// Package manager chain used for dependency installs.
    #[serde(default)]
    pub install: InstallPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,

    /// Directory containing the configuration file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Value of a single tool option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    /// Switch options: `true` emits the template, `false` omits it.
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
}

impl OptionValue {
    /// Parses a value given on the command line.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => OptionValue::Flag(true),
            "false" => OptionValue::Flag(false),
            _ => OptionValue::Text(raw.to_string()),
        }
    }

    fn as_text(&self) -> String {
        match self {
            OptionValue::Flag(b) => b.to_string(),
            OptionValue::Number(n) => n.to_string(),
            OptionValue::Text(s) => s.clone(),
        }
    }
}

fn schema() -> Result<&'static Validator, EngineError> {
    CONFIG_SCHEMA
        .get_or_init(|| {
            let schema_json: serde_json::Value =
                serde_json::from_str(SCHEMA_JSON).map_err(|e| e.to_string())?;
            Validator::new(&schema_json).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| EngineError::internal(format!("Invalid embedded config schema: {}", e)))
}

impl Config {
    /// Config file names, in discovery order.
    pub const CONFIG_FILES: &'static [&'static str] = &[".linthub.jsonc", ".linthub.json"];

    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a configuration file in `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        let dir = dir.as_ref();
        Self::CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Loads configuration from a file.
    ///
    /// Supports `.linthub.jsonc`, `.linthub.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_json(&content)?;

        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }

        Ok(config)
    }

    /// Parses configuration from a JSON (or JSONC) string with schema validation.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let value = jsonc_parser::parse_to_serde_value(json, &ParseOptions::default())
            .map_err(|e| EngineError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        if let Err(e) = schema()?.validate(&value) {
            let error_msg = format!("{} at {}", e, e.instance_path());
            return Err(EngineError::config(format!(
                "Config validation failed: {}",
                error_msg
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| EngineError::config(format!("Invalid config: {}", e)))
    }

    /// Resolves the manifest path against the config file's directory.
    pub fn manifest_path(&self) -> Option<PathBuf> {
        let manifest = self.manifest.as_ref()?;
        Some(match &self.base_dir {
            Some(base) => base.join(manifest),
            None => PathBuf::from(manifest),
        })
    }

    /// Merges `tool:key=value,key=value` specs given on the command line.
    /// Later specs win over earlier ones and over the file.
    pub fn merge_tool_options(&mut self, specs: &[String]) -> Result<(), EngineError> {
        for spec in specs {
            let (tool, options) = parse_tool_options(spec)?;
            self.tool_options.entry(tool).or_default().extend(options);
        }
        Ok(())
    }

    /// Effective timeout for a tool.
    ///
    /// `--tool-options tool:timeout=N` beats the `timeouts` map, which beats
    /// the descriptor default.
    pub fn timeout_for(&self, tool: &ToolDescriptor) -> Result<Duration, EngineError> {
        if let Some(value) = self
            .tool_options
            .get(&tool.name)
            .and_then(|options| options.get(TIMEOUT_OPTION))
        {
            let secs: u64 = value.as_text().parse().map_err(|_| {
                EngineError::config(format!(
                    "Invalid timeout for {}: {:?}",
                    tool.name,
                    value.as_text()
                ))
            })?;
            if secs == 0 {
                return Err(EngineError::config(format!(
                    "Timeout for {} must be positive",
                    tool.name
                )));
            }
            return Ok(Duration::from_secs(secs));
        }

        Ok(self
            .timeouts
            .get(&tool.name)
            .map(|secs| Duration::from_secs(*secs))
            .unwrap_or_else(|| tool.timeout()))
    }

    /// Expands the configured options for `tool` into extra arguments.
    ///
    /// Options are emitted in key order. Unknown option names are a
    /// configuration error.
    pub fn option_args(&self, tool: &ToolDescriptor) -> Result<Vec<String>, EngineError> {
        let Some(options) = self.tool_options.get(&tool.name) else {
            return Ok(Vec::new());
        };

        let mut args = Vec::new();
        for (key, value) in options {
            if key == TIMEOUT_OPTION {
                continue;
            }
            let template = tool.options.get(key).ok_or_else(|| {
                EngineError::config(format!("Unknown option '{}' for tool {}", key, tool.name))
            })?;
            if *value == OptionValue::Flag(false) {
                continue;
            }
            args.push(template.replace(VALUE_PLACEHOLDER, &value.as_text()));
        }
        Ok(args)
    }
}

/// Parses one `tool:key=value,key=value` spec.
pub fn parse_tool_options(
    spec: &str,
) -> Result<(String, BTreeMap<String, OptionValue>), EngineError> {
    let (tool, rest) = spec.split_once(':').ok_or_else(|| {
        EngineError::config(format!(
            "Invalid tool options '{}': expected tool:key=value",
            spec
        ))
    })?;
    let tool = tool.trim();
    if tool.is_empty() {
        return Err(EngineError::config(format!(
            "Invalid tool options '{}': missing tool name",
            spec
        )));
    }

    let mut options = BTreeMap::new();
    for pair in rest.split(',').filter(|p| !p.trim().is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            EngineError::config(format!(
                "Invalid tool option '{}' for {}: expected key=value",
                pair, tool
            ))
        })?;
        options.insert(key.trim().to_string(), OptionValue::parse(value.trim()));
    }

    if options.is_empty() {
        return Err(EngineError::config(format!(
            "Invalid tool options '{}': no options given",
            spec
        )));
    }

    Ok((tool.to_string(), options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linthub_manifest::ToolManifest;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn builtin_tool(name: &str) -> ToolDescriptor {
        ToolManifest::builtin()
            .unwrap()
            .tools
            .into_iter()
            .find(|t| t.name == name)
            .unwrap()
    }

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert!(config.enabled.is_none());
        assert!(config.disabled.is_empty());
        assert!(config.auto_install.is_none());
        assert!(config.base_dir.is_none());
    }

    #[test]
    fn test_config_from_jsonc() {
        let json = r#"{
            // comments are allowed
            "disabled": ["mypy"],
            "auto_install": true,
            "max_workers": 2,
            "timeouts": { "tsc": 300 },
            "tool_options": { "ruff": { "line-length": 120, "select": "E,W" } },
            "output_format": "markdown",
            "group_by": "code"
        }"#;

        let config = Config::from_json(json).unwrap();
        assert_eq!(config.disabled, vec!["mypy".to_string()]);
        assert_eq!(config.auto_install, Some(true));
        assert_eq!(config.max_workers, Some(2));
        assert_eq!(config.timeouts.get("tsc"), Some(&300));
        assert_eq!(config.output_format, Some(OutputFormat::Markdown));
        assert_eq!(config.group_by, Some(GroupBy::Code));

        let ruff = builtin_tool("ruff");
        assert_eq!(
            config.option_args(&ruff).unwrap(),
            vec!["--line-length=120".to_string(), "--select=E,W".to_string()]
        );
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::from_json("").unwrap();
        assert!(config.tool_options.is_empty());
    }

    #[test]
    fn test_discover_prefers_jsonc() {
        let temp = tempfile::tempdir().unwrap();
        assert!(Config::discover(temp.path()).is_none());

        fs::write(temp.path().join(".linthub.json"), "{}").unwrap();
        fs::write(temp.path().join(".linthub.jsonc"), "{}").unwrap();
        assert_eq!(
            Config::discover(temp.path()),
            Some(temp.path().join(".linthub.jsonc"))
        );
    }

    #[test]
    fn test_from_file_sets_base_dir() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".linthub.jsonc");
        fs::write(&path, r#"{ "manifest": "tools.json" }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.base_dir.as_deref(), Some(temp.path()));
        assert_eq!(config.manifest_path(), Some(temp.path().join("tools.json")));
    }

    #[test]
    fn test_timeout_precedence() {
        let tsc = builtin_tool("tsc");
        let mut config = Config::new();
        assert_eq!(config.timeout_for(&tsc).unwrap(), Duration::from_secs(120));

        config.timeouts.insert("tsc".to_string(), 200);
        assert_eq!(config.timeout_for(&tsc).unwrap(), Duration::from_secs(200));

        config
            .merge_tool_options(&["tsc:timeout=5".to_string()])
            .unwrap();
        assert_eq!(config.timeout_for(&tsc).unwrap(), Duration::from_secs(5));
        // timeout is not forwarded to the tool
        assert!(config.option_args(&tsc).unwrap().is_empty());
    }

    #[test]
    fn test_flag_options() {
        let tsc = builtin_tool("tsc");
        let mut config = Config::new();
        config
            .merge_tool_options(&["tsc:strict=true,project=tsconfig.app.json".to_string()])
            .unwrap();
        assert_eq!(
            config.option_args(&tsc).unwrap(),
            vec![
                "--project=tsconfig.app.json".to_string(),
                "--strict".to_string()
            ]
        );

        config
            .merge_tool_options(&["tsc:strict=false".to_string()])
            .unwrap();
        assert_eq!(
            config.option_args(&tsc).unwrap(),
            vec!["--project=tsconfig.app.json".to_string()]
        );
    }

    #[test]
    fn test_unknown_option_rejected() {
        let mut config = Config::new();
        config
            .merge_tool_options(&["ruff:frobnicate=1".to_string()])
            .unwrap();
        let err = config.option_args(&builtin_tool("ruff")).unwrap_err();
        assert!(err.to_string().contains("Unknown option 'frobnicate'"));
    }

    #[rstest]
    #[case::no_colon("ruff", "expected tool:key=value")]
    #[case::no_tool(":a=b", "missing tool name")]
    #[case::no_equals("ruff:select", "expected key=value")]
    #[case::no_options("ruff:", "no options given")]
    fn test_parse_tool_options_errors(#[case] spec: &str, #[case] expected: &str) {
        let err = parse_tool_options(spec).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "Error message '{}' should contain '{}'",
            err,
            expected
        );
    }

    #[rstest]
    #[case::unknown_property(r#"{ "tools": [] }"#, "Config validation failed")]
    #[case::type_mismatch(r#"{ "auto_install": "yes" }"#, "Config validation failed")]
    #[case::invalid_enum_value(r#"{ "group_by": "severity" }"#, "Config validation failed")]
    #[case::zero_workers(r#"{ "max_workers": 0 }"#, "Config validation failed")]
    #[case::bad_json(r#"{ "disabled": [ }"#, "Invalid JSON")]
    fn test_config_validation_errors(#[case] json: &str, #[case] expected_error_part: &str) {
        let result = Config::from_json(json);
        assert!(result.is_err(), "Expected error for JSON: {}", json);
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains(expected_error_part),
            "Error message '{}' should contain '{}'",
            err,
            expected_error_part
        );
    }
}
