//! External health check run before hand-off to the application.

use std::path::PathBuf;

use crate::environment::IsolatedEnvironment;
use crate::error::{ProvisionError, Result};
use crate::shell::{CommandSpec, ProcessRunner, SearchPath};

/// Default health check script name, relative to the app root.
pub const DEFAULT_HEALTH_SCRIPT: &str = "healthcheck.py";

/// Inputs to the health check script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub script: PathBuf,
    pub app_root: PathBuf,
    pub logs_dir: PathBuf,
    pub log_file: PathBuf,
}

impl HealthCheck {
    /// The invocation, using the environment's interpreter.
    pub fn command(&self, env: &IsolatedEnvironment) -> CommandSpec {
        CommandSpec::new(&env.interpreter)
            .arg(&self.script)
            .arg("--app-root")
            .arg(&self.app_root)
            .arg("--logs-dir")
            .arg(&self.logs_dir)
            .arg("--log-file")
            .arg(&self.log_file)
            .cwd(&self.app_root)
            .capture()
    }

    /// Run the script; a missing script or non-zero exit fails.
    pub fn run(
        &self,
        runner: &dyn ProcessRunner,
        env: &IsolatedEnvironment,
        search_path: &SearchPath,
    ) -> Result<()> {
        if !self.script.is_file() {
            return Err(ProvisionError::HealthCheck {
                message: format!("script not found: {}", self.script.display()),
            });
        }

        let result = runner.run(&self.command(env).search_path(search_path))?;
        if !result.success {
            let detail = result.stderr.trim();
            return Err(ProvisionError::HealthCheck {
                message: if detail.is_empty() {
                    format!("exited with code {:?}", result.exit_code)
                } else {
                    format!("exited with code {:?}: {}", result.exit_code, detail)
                },
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::MockRunner;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(temp: &TempDir) -> (HealthCheck, IsolatedEnvironment) {
        let app = temp.path().to_path_buf();
        let check = HealthCheck {
            script: app.join(DEFAULT_HEALTH_SCRIPT),
            app_root: app.clone(),
            logs_dir: app.join("logger").join("logs"),
            log_file: app.join("logger").join("logs").join("provision.log"),
        };
        let env = IsolatedEnvironment {
            root: app.join("venv"),
            interpreter: app.join("venv").join("bin").join("python"),
            scripts_dir: app.join("venv").join("bin"),
        };
        (check, env)
    }

    #[test]
    fn missing_script_fails() {
        let temp = TempDir::new().unwrap();
        let (check, env) = fixture(&temp);
        let runner = MockRunner::new();

        let err = check
            .run(&runner, &env, &SearchPath::default())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::HealthCheck { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn passes_paths_as_arguments() {
        let temp = TempDir::new().unwrap();
        let (check, env) = fixture(&temp);
        fs::write(&check.script, "").unwrap();
        let runner = MockRunner::new();

        check.run(&runner, &env, &SearchPath::default()).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("healthcheck.py --app-root"));
        assert!(calls[0].contains("--logs-dir"));
        assert!(calls[0].contains("--log-file"));
    }

    #[test]
    fn non_zero_exit_fails() {
        let temp = TempDir::new().unwrap();
        let (check, env) = fixture(&temp);
        fs::write(&check.script, "").unwrap();
        let runner = MockRunner::new();
        runner.respond("healthcheck.py", 1, "");

        let err = check
            .run(&runner, &env, &SearchPath::default())
            .unwrap_err();
        assert_eq!(err.kind(), "HealthCheckError");
    }
}
