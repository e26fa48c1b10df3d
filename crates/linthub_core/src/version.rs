//! Tool version detection and minimum-version checks.

use std::path::Path;
use std::time::Duration;

use semver::Version;
use tracing::debug;

use crate::parsers::{Pattern, strip_ansi};
use crate::process::{self, CommandSpec};

/// Upper bound for a `--version` invocation.
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(30);

static VERSION_RE: Pattern = Pattern::new(r"\bv?(\d+(?:\.\d+){0,3})");

/// Converts `"22"`, `"22.1"` or `"22.1.3"` into a semver version, padding
/// missing components with zero. A fourth component is ignored.
pub fn normalize(raw: &str) -> Option<Version> {
    let mut parts = raw
        .trim()
        .trim_start_matches(['v', 'V'])
        .split('.')
        .map(|p| p.parse::<u64>());

    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Finds the first version-looking token in `--version` output.
pub fn parse_version(output: &str) -> Option<Version> {
    let cleaned = strip_ansi(output);
    let captures = VERSION_RE.get().captures(&cleaned)?;
    normalize(captures.get(1)?.as_str())
}

/// True when `installed` satisfies `minimum`.
pub fn meets_minimum(installed: &Version, minimum: &Version) -> bool {
    installed >= minimum
}

/// Runs the tool's version command and parses its output.
///
/// Returns `None` if the command cannot run, fails, or prints nothing
/// recognisable.
pub async fn query_version(argv: &[String], cwd: &Path) -> Option<Version> {
    let spec = CommandSpec::from_argv(argv)?.cwd(cwd);
    match process::run(&spec, VERSION_TIMEOUT).await {
        Ok(output) if output.success() => {
            let combined = format!("{}\n{}", output.stdout, output.stderr);
            let version = parse_version(&combined);
            debug!("{} reports version {:?}", spec.program_name(), version);
            version
        }
        Ok(output) => {
            debug!(
                "{} version check exited with {:?}",
                spec.program_name(),
                output.exit_code
            );
            None
        }
        Err(e) => {
            debug!("Version check failed: {}", e);
            None
        }
    }
}
