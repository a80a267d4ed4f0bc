//! Post-install hooks.
//!
//! Some packages ship a script that must run once after installation (the
//! pywin32 DLL registration being the usual case). A hook names a script
//! relative to the environment's scripts directory; hooks whose script is
//! absent are skipped.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::environment::IsolatedEnvironment;
use crate::error::{ProvisionError, Result};
use crate::logging::RunLog;
use crate::shell::{CommandSpec, ProcessRunner, SearchPath};

/// A script to run inside the environment after dependencies install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostInstallHook {
    pub name: String,
    /// Path relative to the environment's scripts directory.
    pub script: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl PostInstallHook {
    /// pywin32's post-install registration.
    pub fn pywin32() -> Self {
        Self {
            name: "pywin32".to_string(),
            script: PathBuf::from("pywin32_postinstall.py"),
            args: vec!["-install".to_string()],
        }
    }

    /// Hooks used when the configuration names none.
    pub fn defaults() -> Vec<Self> {
        vec![Self::pywin32()]
    }
}

/// Run each hook whose script exists. Returns the names of hooks that ran.
pub fn run_hooks(
    runner: &dyn ProcessRunner,
    log: &RunLog,
    env: &IsolatedEnvironment,
    hooks: &[PostInstallHook],
    search_path: &SearchPath,
) -> Result<Vec<String>> {
    let mut ran = Vec::new();

    for hook in hooks {
        let script = env.scripts_dir.join(&hook.script);
        if !script.is_file() {
            log.info(format!(
                "Skipping post-install hook '{}': {} not present",
                hook.name,
                script.display()
            ));
            continue;
        }

        let spec = CommandSpec::new(&env.interpreter)
            .arg(&script)
            .args(&hook.args)
            .cwd(&env.root)
            .search_path(search_path)
            .capture();
        let result = runner.run(&spec)?;
        if !result.success {
            return Err(ProvisionError::PostInstallHook {
                hook: hook.name.clone(),
                code: result.exit_code,
            });
        }
        ran.push(hook.name.clone());
    }

    Ok(ran)
}
