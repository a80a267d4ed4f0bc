//! Deciding whether to provision, then handing off to the application.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::environment::IsolatedEnvironment;
use crate::error::{ProvisionError, Result};
use crate::logging::RunLog;
use crate::shell::{CommandSpec, ProcessRunner, SearchPath};

/// How long the environment interpreter's self-check may take.
pub const SELF_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// State of the environment as seen before launching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    MissingInterpreter,
    Unhealthy,
    ReprovisionRequested,
}

impl Readiness {
    pub fn needs_provisioning(&self) -> bool {
        *self != Readiness::Ready
    }

    fn describe(&self) -> &'static str {
        match self {
            Readiness::Ready => "environment is ready",
            Readiness::MissingInterpreter => "environment interpreter is missing",
            Readiness::Unhealthy => "environment interpreter failed its self-check",
            Readiness::ReprovisionRequested => "reprovisioning was requested",
        }
    }
}

/// Check the environment without modifying it.
pub fn check_readiness(
    runner: &dyn ProcessRunner,
    env: &IsolatedEnvironment,
    reprovision: bool,
) -> Readiness {
    if reprovision {
        return Readiness::ReprovisionRequested;
    }
    if !env.has_interpreter() {
        return Readiness::MissingInterpreter;
    }

    let spec = CommandSpec::new(&env.interpreter)
        .arg("--version")
        .capture()
        .timeout(SELF_CHECK_TIMEOUT);
    match runner.run(&spec) {
        Ok(result) if result.success => Readiness::Ready,
        _ => Readiness::Unhealthy,
    }
}

/// Launches the application inside its environment.
pub struct Launcher<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub log: &'a RunLog,
    pub environment: IsolatedEnvironment,
    pub app_root: PathBuf,
    pub entry: PathBuf,
    pub search_path: SearchPath,
}

impl Launcher<'_> {
    /// Provision if needed, then run the entry script with `args`.
    ///
    /// Returns the application's exit code; termination by signal maps to
    /// 1. A provisioning error is returned as-is and nothing is launched.
    pub fn launch<F>(&self, args: &[OsString], reprovision: bool, provision: F) -> Result<i32>
    where
        F: FnOnce() -> Result<()>,
    {
        let readiness = check_readiness(self.runner, &self.environment, reprovision);
        if readiness.needs_provisioning() {
            self.log
                .info(format!("Provisioning required: {}", readiness.describe()));
            provision()?;
        } else {
            tracing::debug!("{}", readiness.describe());
        }

        if !self.entry.is_file() {
            let err = ProvisionError::preflight(format!(
                "application entry not found: {}",
                self.entry.display()
            ));
            self.log.error(&err);
            return Err(err);
        }

        let search_path = self
            .search_path
            .prepend(vec![self.environment.scripts_dir.clone()]);
        let spec = CommandSpec::new(&self.environment.interpreter)
            .arg(&self.entry)
            .args(args)
            .cwd(&self.app_root)
            .search_path(&search_path);

        self.log.info(format!("Launching {}", spec.display_line()));
        let result = self.runner.run(&spec).inspect_err(|e| self.log.error(e))?;
        let code = result.exit_code.unwrap_or(1);
        self.log.info(format!("Application exited with code {}", code));
        Ok(code)
    }
}
