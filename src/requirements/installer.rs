//! Populating the environment from a validated manifest.

use serde::{Deserialize, Serialize};

use crate::environment::IsolatedEnvironment;
use crate::error::{ProvisionError, Result};
use crate::shell::{CommandSpec, ProcessRunner, SearchPath};

use super::manifest::ValidatedManifest;

/// Flags every pip invocation carries.
const PIP_COMMON_FLAGS: [&str; 3] = ["--no-input", "--no-cache-dir", "--disable-pip-version-check"];

/// pip network behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PipOptions {
    /// Passed as `--retries`.
    pub retries: u32,
    /// Passed as `--timeout`, in seconds.
    pub timeout_secs: u64,
}

impl Default for PipOptions {
    fn default() -> Self {
        Self {
            retries: 5,
            timeout_secs: 60,
        }
    }
}

/// Installs tooling and manifest dependencies into an environment.
pub struct DependencyInstaller<'a> {
    runner: &'a dyn ProcessRunner,
    pip: PipOptions,
}

impl<'a> DependencyInstaller<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, pip: PipOptions) -> Self {
        Self { runner, pip }
    }

    /// Upgrade the packaging tooling, then install the manifest.
    pub fn install(
        &self,
        env: &IsolatedEnvironment,
        manifest: &ValidatedManifest,
        search_path: &SearchPath,
    ) -> Result<()> {
        let upgrade = CommandSpec::new(&env.interpreter)
            .args(["-m", "pip", "install", "--upgrade", "pip", "setuptools", "wheel"])
            .args(PIP_COMMON_FLAGS);
        self.run_step("upgrade tooling", upgrade, manifest, search_path)?;

        let install = CommandSpec::new(&env.interpreter)
            .args(["-m", "pip", "install", "-r"])
            .arg(manifest.path())
            .arg("--retries")
            .arg(self.pip.retries.to_string())
            .arg("--timeout")
            .arg(self.pip.timeout_secs.to_string())
            .args(PIP_COMMON_FLAGS);
        self.run_step("install manifest", install, manifest, search_path)
    }

    fn run_step(
        &self,
        step: &str,
        spec: CommandSpec,
        manifest: &ValidatedManifest,
        search_path: &SearchPath,
    ) -> Result<()> {
        let spec = spec.cwd(manifest.dir()).search_path(search_path).capture();
        let result = self.runner.run(&spec)?;
        if !result.success {
            return Err(ProvisionError::DependencyInstall {
                step: step.to_string(),
                code: result.exit_code,
            });
        }
        Ok(())
    }
}
