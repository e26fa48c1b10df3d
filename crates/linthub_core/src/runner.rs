//! Tool runner.
//!
//! Runs one planned tool as a subprocess and turns whatever happened into an
//! [`ExecutionResult`]. The runner never fails: spawn errors, timeouts and
//! crashes are all recorded as statuses.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use linthub_manifest::{PATHS_PLACEHOLDER, ToolDescriptor};
use tracing::{debug, info, warn};

use crate::EngineError;
use crate::config::Config;
use crate::install::InstallGate;
use crate::parsers::parser_for;
use crate::process::{self, CommandSpec, ProcessError};
use crate::result::{ExecutionResult, ExecutionStatus, Mode};

/// Everything needed to invoke one tool, resolved ahead of time.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool: Arc<ToolDescriptor>,
    pub mode: Mode,
    /// Files handed to the tool through `{paths}`.
    pub paths: Vec<PathBuf>,
    /// Arguments expanded from configured tool options.
    pub option_args: Vec<String>,
    pub timeout: Duration,
}

/// Builds the argv (without the program) for an invocation.
///
/// `{paths}` expands to one argument per path and option arguments are
/// inserted just before it. Without a placeholder the tool runs
/// project-wide and options go last.
pub fn build_args(template: &[String], paths: &[PathBuf], options: &[String]) -> Vec<OsString> {
    let mut args = Vec::with_capacity(template.len() + paths.len() + options.len());
    let mut options_emitted = false;
    for arg in template {
        if arg == PATHS_PLACEHOLDER {
            if !options_emitted {
                args.extend(options.iter().map(OsString::from));
                options_emitted = true;
            }
            args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
        } else {
            args.push(OsString::from(arg));
        }
    }
    if !options_emitted {
        args.extend(options.iter().map(OsString::from));
    }
    args
}

/// Executes tools in the project root.
pub struct ToolRunner {
    root: PathBuf,
    installer: Option<Arc<InstallGate>>,
}

impl ToolRunner {
    /// Creates a runner. Dependencies are installed only when `installer`
    /// is present.
    pub fn new(root: impl Into<PathBuf>, installer: Option<Arc<InstallGate>>) -> Self {
        Self {
            root: root.into(),
            installer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs the tool described by `invocation` and classifies the outcome.
    pub async fn run(&self, invocation: &Invocation) -> ExecutionResult {
        let tool = &invocation.tool;
        let mode = invocation.mode;

        let mut install_error = None;
        if let (Some(dep), Some(installer)) = (&tool.dependency, &self.installer)
            && let Err(e) = installer.ensure(dep).await
        {
            install_error = Some(e.to_string());
        }

        let args = build_args(
            tool.args_template(mode.is_fix()),
            &invocation.paths,
            &invocation.option_args,
        );
        let spec = CommandSpec::new(&tool.command.program)
            .args(args)
            .cwd(&self.root);

        info!("Running {} ({})", tool.name, mode);
        let output = match process::run(&spec, invocation.timeout).await {
            Ok(output) => output,
            Err(ProcessError::NotFound { program }) => {
                warn!("{}: executable not found: {}", tool.name, program);
                return ExecutionResult::empty(&tool.name, mode, ExecutionStatus::NotFound)
                    .with_note(format!("executable not found: {}", program));
            }
            Err(e) => {
                warn!("{}: {}", tool.name, e);
                return ExecutionResult::empty(&tool.name, mode, ExecutionStatus::ToolError)
                    .with_note(e.to_string());
            }
        };

        if output.timed_out {
            warn!(
                "{} timed out after {}s",
                tool.name,
                invocation.timeout.as_secs()
            );
            return ExecutionResult {
                duration: output.duration,
                ..ExecutionResult::empty(&tool.name, mode, ExecutionStatus::Timeout)
            }
            .with_note(format!(
                "timed out after {}s",
                invocation.timeout.as_secs()
            ));
        }

        let outcome = parser_for(tool.parser).parse(&tool.name, &output.stdout, &output.stderr);
        if outcome.skipped_lines > 0 {
            debug!(
                "{}: {} output lines not understood",
                tool.name, outcome.skipped_lines
            );
        }

        let status = ExecutionStatus::classify(
            &outcome.issues,
            output.exit_code,
            install_error.is_some(),
        );
        let note = match status {
            ExecutionStatus::DependencyMissing => install_error.or_else(|| {
                tool.dependency
                    .as_ref()
                    .map(|dep| format!("{} incomplete", dep.install_dir))
            }),
            ExecutionStatus::ToolError => Some(match output.exit_code {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by signal".to_string(),
            }),
            _ => install_error,
        };

        debug!(
            "{} finished: {} in {:?} ({} issues)",
            tool.name,
            status,
            output.duration,
            outcome.issues.len()
        );

        ExecutionResult {
            tool: tool.name.clone(),
            mode,
            exit_code: output.exit_code,
            duration: output.duration,
            issues: outcome.issues,
            raw_output: join_output(&output.stdout, &output.stderr),
            status,
            skipped_lines: outcome.skipped_lines,
            note,
        }
    }
}

fn join_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (true, true) => String::new(),
        (false, true) => stdout.trim_end().to_string(),
        (true, false) => stderr.trim_end().to_string(),
        (false, false) => format!("{}\n{}", stdout.trim_end(), stderr.trim_end()),
    }
}

/// Resolves option arguments and the timeout for `tool`, failing on unknown
/// option names or invalid timeouts.
pub fn prepare(
    tool: Arc<ToolDescriptor>,
    mode: Mode,
    paths: Vec<PathBuf>,
    config: &Config,
) -> Result<Invocation, EngineError> {
    let option_args = config.option_args(&tool)?;
    let timeout = config.timeout_for(&tool)?;
    Ok(Invocation {
        tool,
        mode,
        paths,
        option_args,
        timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::descriptor;
    use pretty_assertions::assert_eq;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_build_args_expands_paths() {
        let template = strings(&["check", "--output-format=json", "{paths}"]);
        let paths = vec![PathBuf::from("a.py"), PathBuf::from("src/b.py")];
        let options = strings(&["--select=E"]);
        assert_eq!(
            build_args(&template, &paths, &options),
            os(&["check", "--output-format=json", "--select=E", "a.py", "src/b.py"])
        );
    }

    #[test]
    fn test_build_args_without_placeholder() {
        let template = strings(&["--noEmit", "--pretty", "false"]);
        let paths = vec![PathBuf::from("a.ts")];
        assert_eq!(
            build_args(&template, &paths, &strings(&["--strict"])),
            os(&["--noEmit", "--pretty", "false", "--strict"])
        );
    }

    #[cfg(unix)]
    mod process_tests {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::install::{InstallPolicy, PackageManager};
        use crate::issue::{Issue, IssueKind};
        use linthub_manifest::{DependencySpec, ParserKind};
        use std::fs;
        use std::time::Instant;
        use tempfile::TempDir;

        fn sh_tool(name: &str, script: &str) -> Arc<ToolDescriptor> {
            let mut tool = descriptor(name, 10, &["*.py"]);
            tool.command.program = "sh".to_string();
            tool.command.check_args = strings(&["-c", script, "sh", "{paths}"]);
            Arc::new(tool)
        }

        fn invocation(tool: Arc<ToolDescriptor>, paths: &[&str]) -> Invocation {
            Invocation {
                tool,
                mode: Mode::Check,
                paths: paths.iter().map(PathBuf::from).collect(),
                option_args: Vec::new(),
                timeout: Duration::from_secs(10),
            }
        }

        #[tokio::test]
        async fn test_clean_run() {
            let temp = TempDir::new().unwrap();
            let runner = ToolRunner::new(temp.path(), None);
            let result = runner
                .run(&invocation(sh_tool("clean", "exit 0"), &["a.py"]))
                .await;

            assert_eq!(result.status, ExecutionStatus::Ok);
            assert_eq!(result.exit_code, Some(0));
            assert!(result.issues.is_empty());
            assert_eq!(result.note, None);
        }

        #[tokio::test]
        async fn test_issues_parsed_with_paths() {
            let temp = TempDir::new().unwrap();
            let runner = ToolRunner::new(temp.path(), None);
            let script = r#"for f in "$@"; do echo "$f:3:1: [error] bad thing (rule-x)"; done; exit 1"#;
            let result = runner
                .run(&invocation(sh_tool("lint", script), &["a.py", "b.py"]))
                .await;

            assert_eq!(result.status, ExecutionStatus::IssuesFound);
            assert_eq!(
                result.issues,
                vec![
                    Issue::new("lint", "a.py", 3, "bad thing")
                        .with_column(1)
                        .with_code("rule-x"),
                    Issue::new("lint", "b.py", 3, "bad thing")
                        .with_column(1)
                        .with_code("rule-x"),
                ]
            );
        }

        #[tokio::test]
        async fn test_crash_without_output_is_tool_error() {
            let temp = TempDir::new().unwrap();
            let runner = ToolRunner::new(temp.path(), None);
            let result = runner
                .run(&invocation(sh_tool("crash", "echo boom >&2; exit 3"), &[]))
                .await;

            assert_eq!(result.status, ExecutionStatus::ToolError);
            assert_eq!(result.exit_code, Some(3));
            assert_eq!(result.raw_output, "boom");
            assert_eq!(result.skipped_lines, 1);
            assert_eq!(result.note.as_deref(), Some("exited with code 3"));
        }

        #[tokio::test]
        async fn test_missing_executable() {
            let temp = TempDir::new().unwrap();
            let runner = ToolRunner::new(temp.path(), None);
            let mut tool = descriptor("ghost", 10, &["*.py"]);
            tool.command.program = "linthub-test-no-such-tool".to_string();
            let result = runner.run(&invocation(Arc::new(tool), &["a.py"])).await;

            assert_eq!(result.status, ExecutionStatus::NotFound);
            assert!(result.note.unwrap().contains("linthub-test-no-such-tool"));
        }

        #[tokio::test]
        async fn test_timeout_kills_tool() {
            let temp = TempDir::new().unwrap();
            let runner = ToolRunner::new(temp.path(), None);
            let mut inv = invocation(sh_tool("slow", "sleep 10"), &[]);
            inv.timeout = Duration::from_secs(1);

            let started = Instant::now();
            let result = runner.run(&inv).await;

            assert_eq!(result.status, ExecutionStatus::Timeout);
            assert!(started.elapsed() < Duration::from_secs(5));
            assert_eq!(result.note.as_deref(), Some("timed out after 1s"));
        }

        #[tokio::test]
        async fn test_failed_install_marks_dependency_missing() {
            let temp = TempDir::new().unwrap();
            fs::write(temp.path().join("package.json"), "{}").unwrap();
            let policy = InstallPolicy {
                managers: vec![PackageManager {
                    program: "sh".to_string(),
                    frozen_args: Vec::new(),
                    install_args: strings(&["-c", "echo offline >&2; exit 1"]),
                }],
                timeout: 10,
            };
            let gate = Arc::new(InstallGate::new(temp.path(), policy));
            let runner = ToolRunner::new(temp.path(), Some(gate));

            let mut tool = (*sh_tool("tsc", "exit 2")).clone();
            tool.parser = ParserKind::Tsc;
            tool.dependency = Some(DependencySpec {
                manifest: "package.json".to_string(),
                install_dir: "node_modules".to_string(),
            });
            let result = runner.run(&invocation(Arc::new(tool), &[])).await;

            assert_eq!(result.status, ExecutionStatus::DependencyMissing);
            assert!(result.note.unwrap().contains("offline"));
        }

        #[tokio::test]
        async fn test_dependency_issues_classified() {
            let temp = TempDir::new().unwrap();
            let runner = ToolRunner::new(temp.path(), None);
            let script = "echo \"src/a.ts(1,20): error TS2307: Cannot find module 'react' or its corresponding type declarations.\"; exit 2";
            let mut tool = (*sh_tool("tsc", script)).clone();
            tool.parser = ParserKind::Tsc;
            let result = runner.run(&invocation(Arc::new(tool), &[])).await;

            assert_eq!(result.status, ExecutionStatus::DependencyMissing);
            assert_eq!(result.issues[0].kind, IssueKind::DependencyMissing);
        }
    }
}
