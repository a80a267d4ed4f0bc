//! Effective provisioning settings.
//!
//! Precedence, highest first: command-line flags (and their env vars),
//! the config file, built-in defaults. Relative paths resolve against the
//! app root.

use std::path::{Path, PathBuf};

use crate::config::schema::FileConfig;
use crate::health::{HealthCheck, DEFAULT_HEALTH_SCRIPT};
use crate::hooks::PostInstallHook;
use crate::requirements::{PinPolicy, PipOptions};
use crate::runtime::{Architecture, InstallOptions, InstallScope, RuntimeVersion, TargetSpec};

/// Runtime version provisioned when nothing else is configured.
pub const DEFAULT_PYTHON_VERSION: RuntimeVersion = RuntimeVersion::new(3, 11, 9);

/// Values supplied on the command line. `None`/`false` defers to the file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub venv: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub python_version: Option<RuntimeVersion>,
    pub arch: Option<Architecture>,
    pub all_users: bool,
    pub skip_health_check: bool,
    pub allow_unpinned: bool,
}

/// Everything a provisioning run or launch needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSettings {
    pub app_root: PathBuf,
    pub venv: PathBuf,
    pub manifest: PathBuf,
    pub log_file: PathBuf,
    pub target: TargetSpec,
    pub pin_policy: PinPolicy,
    pub skip_health_check: bool,
    pub health_script: PathBuf,
    pub app_entry: PathBuf,
    pub install: InstallOptions,
    pub pip: PipOptions,
    pub hooks: Vec<PostInstallHook>,
}

impl ProvisionSettings {
    /// Merge flags, file and defaults for `app_root`.
    pub fn resolve(app_root: &Path, file: &FileConfig, cli: &SettingsOverrides) -> Self {
        let version = cli
            .python_version
            .or(file.python_version)
            .unwrap_or(DEFAULT_PYTHON_VERSION);
        let all_users = cli.all_users || file.all_users.unwrap_or(false);

        let mut install = InstallOptions {
            sha256: file.installer_sha256.clone(),
            ..InstallOptions::default()
        };
        if let Some(url) = &file.distribution_url {
            install.distribution_url = url.clone();
        }

        Self {
            app_root: app_root.to_path_buf(),
            venv: pick_path(app_root, &cli.venv, &file.venv, "venv"),
            manifest: pick_path(app_root, &cli.manifest, &file.manifest, "requirements.txt"),
            log_file: pick_path(
                app_root,
                &cli.log_file,
                &file.log_file,
                "logger/logs/provision.log",
            ),
            target: TargetSpec {
                version,
                arch: cli.arch.unwrap_or_default(),
                scope: InstallScope::from_all_users(all_users),
            },
            pin_policy: PinPolicy::from_allow_unpinned(cli.allow_unpinned),
            skip_health_check: cli.skip_health_check || file.skip_health_check.unwrap_or(false),
            health_script: pick_path(app_root, &None, &file.health_check, DEFAULT_HEALTH_SCRIPT),
            app_entry: pick_path(app_root, &None, &file.app_entry, "main.py"),
            install,
            pip: file.pip.unwrap_or_default(),
            hooks: file
                .post_install_hooks
                .clone()
                .unwrap_or_else(PostInstallHook::defaults),
        }
    }

    /// Directory holding the log file.
    pub fn logs_dir(&self) -> &Path {
        self.log_file.parent().unwrap_or(&self.app_root)
    }

    /// The health check this run performs.
    pub fn health_check(&self) -> HealthCheck {
        HealthCheck {
            script: self.health_script.clone(),
            app_root: self.app_root.clone(),
            logs_dir: self.logs_dir().to_path_buf(),
            log_file: self.log_file.clone(),
        }
    }
}

/// First of flag, file key, default; resolved against the app root.
fn pick_path(
    app_root: &Path,
    flag: &Option<PathBuf>,
    key: &Option<PathBuf>,
    default: &str,
) -> PathBuf {
    let chosen = flag
        .as_deref()
        .or(key.as_deref())
        .unwrap_or(Path::new(default));
    app_root.join(chosen)
}
