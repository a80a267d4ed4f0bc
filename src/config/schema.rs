//! Configuration file schema.
//!
//! Every key is optional; absent keys fall back to built-in defaults and
//! command-line flags override whatever the file says. Unknown keys are
//! rejected so typos surface instead of being silently ignored.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::hooks::PostInstallHook;
use crate::requirements::PipOptions;
use crate::runtime::RuntimeVersion;

/// Root of `kindling.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Target runtime version, e.g. `3.11.9`.
    pub python_version: Option<RuntimeVersion>,

    /// Isolated environment directory.
    pub venv: Option<PathBuf>,

    /// Requirements manifest.
    pub manifest: Option<PathBuf>,

    /// Provisioning log file.
    pub log_file: Option<PathBuf>,

    /// Install the runtime for all users.
    pub all_users: Option<bool>,

    /// Skip the external health check.
    pub skip_health_check: Option<bool>,

    /// Health check script.
    pub health_check: Option<PathBuf>,

    /// Application entry script launched after provisioning.
    pub app_entry: Option<PathBuf>,

    /// Base URL of the runtime distribution.
    pub distribution_url: Option<String>,

    /// Expected SHA-256 of the runtime installer.
    pub installer_sha256: Option<String>,

    /// pip network settings.
    pub pip: Option<PipOptions>,

    /// Scripts run after dependencies install. Replaces the defaults.
    pub post_install_hooks: Option<Vec<PostInstallHook>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config: FileConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn parses_all_keys() {
        let yaml = r#"
python_version: 3.12.4
venv: .venv
manifest: deps/requirements.txt
log_file: logs/setup.log
all_users: true
skip_health_check: true
health_check: tools/check.py
app_entry: app.py
distribution_url: https://mirror.example.org/python
installer_sha256: abc123
pip:
  retries: 2
  timeout_secs: 30
post_install_hooks:
  - name: register
    script: register.py
    args: ["--quiet"]
"#;
        let config: FileConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.python_version, Some(RuntimeVersion::new(3, 12, 4)));
        assert_eq!(config.venv, Some(PathBuf::from(".venv")));
        assert_eq!(config.all_users, Some(true));
        assert_eq!(config.pip.unwrap().retries, 2);
        let hooks = config.post_install_hooks.unwrap();
        assert_eq!(hooks[0].args, vec!["--quiet"]);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = serde_yaml::from_str::<FileConfig>("allow_unpinned: true").unwrap_err();
        assert!(err.to_string().contains("allow_unpinned"));
    }

    #[test]
    fn rejects_malformed_version() {
        assert!(serde_yaml::from_str::<FileConfig>("python_version: 3.11").is_err());
    }
}
