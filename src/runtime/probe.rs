//! Probing a candidate executable for its runtime version.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shell::{CommandSpec, ProcessRunner};

use super::version::RuntimeVersion;

/// How long a single `--version` probe may take.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// An executable that answered a version probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCandidate {
    pub executable: PathBuf,
    pub version: RuntimeVersion,
}

impl RuntimeCandidate {
    /// Directory containing the executable.
    pub fn dir(&self) -> &Path {
        self.executable.parent().unwrap_or(Path::new(""))
    }
}

/// Run `<exe> --version` and parse the self-reported version.
///
/// Returns `None` for anything short of a clean answer: spawn failure,
/// non-zero exit, timeout, or output without a version. Older interpreters
/// print the version on stderr, so both streams are read.
pub fn probe(runner: &dyn ProcessRunner, executable: &Path) -> Option<RuntimeCandidate> {
    let spec = CommandSpec::new(executable)
        .arg("--version")
        .capture()
        .timeout(PROBE_TIMEOUT);

    let result = match runner.run(&spec) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!("Probe of {} failed to start: {}", executable.display(), e);
            return None;
        }
    };

    if !result.success {
        tracing::debug!(
            "Probe of {} exited with {:?}",
            executable.display(),
            result.exit_code
        );
        return None;
    }

    let version = RuntimeVersion::parse_reported(&result.stdout)
        .or_else(|| RuntimeVersion::parse_reported(&result.stderr))?;

    Some(RuntimeCandidate {
        executable: executable.to_path_buf(),
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::shell::{CommandResult, MockRunner};

    #[test]
    fn probe_parses_stdout() {
        let runner = MockRunner::new();
        runner.respond("/usr/bin/python3 --version", 0, "Python 3.11.9\n");

        let candidate = probe(&runner, Path::new("/usr/bin/python3")).unwrap();
        assert_eq!(candidate.version, RuntimeVersion::new(3, 11, 9));
        assert_eq!(candidate.dir(), Path::new("/usr/bin"));
    }

    #[test]
    fn probe_falls_back_to_stderr() {
        struct StderrRunner;
        impl ProcessRunner for StderrRunner {
            fn run(&self, _spec: &CommandSpec) -> Result<CommandResult> {
                Ok(CommandResult::success(
                    String::new(),
                    "Python 2.7.18".to_string(),
                    Duration::ZERO,
                ))
            }
        }

        let candidate = probe(&StderrRunner, Path::new("/usr/bin/python")).unwrap();
        assert_eq!(candidate.version, RuntimeVersion::new(2, 7, 18));
    }

    #[test]
    fn probe_discards_failures() {
        let runner = MockRunner::new();
        runner
            .respond("broken", 9009, "")
            .respond("garbled", 0, "not a version")
            .fail_to_start("missing");

        assert!(probe(&runner, Path::new("/opt/broken/python")).is_none());
        assert!(probe(&runner, Path::new("/opt/garbled/python")).is_none());
        assert!(probe(&runner, Path::new("/opt/missing/python")).is_none());
    }

    #[test]
    fn probe_asks_for_version_only() {
        let runner = MockRunner::new();
        probe(&runner, Path::new("python3"));
        assert_eq!(runner.calls(), vec!["python3 --version"]);
    }
}
