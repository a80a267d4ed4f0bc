//! Unattended installation of the runtime from the vendor distribution.
//!
//! Every precondition (supported host, vendor package for this OS,
//! privileges for an all-users install) is checked before the network is
//! touched. The downloaded package lives in a scratch file that is removed
//! whatever the outcome.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};
use crate::fetch::{sha256_file, Distribution};
use crate::shell::{CommandSpec, HostInfo, ProcessRunner, SearchPath};

use super::layout::{HostLayout, InstallerKind, InstallerPackage, DEFAULT_DISTRIBUTION_URL};
use super::probe::RuntimeCandidate;
use super::resolver::VersionResolver;
use super::version::{InstallScope, TargetSpec};

/// Where packages come from and how they are verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub distribution_url: String,
    /// Expected hex SHA-256 of the installer package.
    pub sha256: Option<String>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            distribution_url: DEFAULT_DISTRIBUTION_URL.to_string(),
            sha256: None,
        }
    }
}

/// Installs the target runtime when no adequate one exists.
pub struct RuntimeInstaller<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub distribution: &'a dyn Distribution,
    pub layout: &'a HostLayout,
    pub host: &'a HostInfo,
    /// Whether the current process holds administrator/root rights.
    pub elevated: bool,
    pub options: &'a InstallOptions,
}

impl RuntimeInstaller<'_> {
    /// Check every precondition and pick the package to install.
    pub fn preflight(&self, target: &TargetSpec) -> Result<InstallerPackage> {
        self.host.check_supported()?;

        let package = self
            .layout
            .installer_package(target, &self.options.distribution_url)
            .ok_or_else(|| {
                ProvisionError::preflight(format!(
                    "no vendor installer for {}; install Python {} with the system package manager",
                    self.host.os.name(),
                    target.version.short()
                ))
            })?;

        if target.scope == InstallScope::AllUsers && !self.elevated {
            return Err(ProvisionError::Privilege {
                message: "an all-users install requires administrator rights".to_string(),
            });
        }

        Ok(package)
    }

    /// Download, verify and run the vendor installer, then locate the result.
    pub fn install(&self, target: &TargetSpec, search_path: &SearchPath) -> Result<RuntimeCandidate> {
        let package = self.preflight(target)?;

        self.distribution.check_reachable(&package.url)?;

        let scratch = ScratchFile(self.layout.scratch_dir().join(&package.file_name));
        let bytes = self.distribution.download(&package.url, scratch.path())?;
        tracing::info!("Downloaded {} ({} bytes)", package.file_name, bytes);

        if let Some(expected) = &self.options.sha256 {
            verify_digest(&package.url, scratch.path(), expected)?;
        }

        let spec = installer_command(&package, scratch.path(), target.scope);
        let result = self.runner.run(&spec)?;
        if !result.success {
            return Err(ProvisionError::InstallerExecution {
                installer: PathBuf::from(&package.file_name),
                code: result.exit_code,
            });
        }
        drop(scratch);

        let expected_dir = self.layout.expected_install_dir(target);
        VersionResolver::new(self.runner, self.layout, search_path)
            .resolve_after_install(target, expected_dir.as_deref())
            .ok_or_else(|| ProvisionError::RuntimeNotFound {
                version: target.version.to_string(),
            })
    }
}

/// The unattended invocation for a downloaded package.
pub fn installer_command(package: &InstallerPackage, local: &Path, scope: InstallScope) -> CommandSpec {
    let spec = match package.kind {
        InstallerKind::WindowsExe => {
            let all_users = match scope {
                InstallScope::AllUsers => "InstallAllUsers=1",
                InstallScope::CurrentUser => "InstallAllUsers=0",
            };
            CommandSpec::new(local).args([
                "/quiet",
                all_users,
                "PrependPath=1",
                "Include_test=0",
                "Include_pip=1",
                "Shortcuts=0",
            ])
        }
        InstallerKind::MacPkg => {
            let target = match scope {
                InstallScope::AllUsers => "/",
                InstallScope::CurrentUser => "CurrentUserHomeDirectory",
            };
            CommandSpec::new("/usr/sbin/installer")
                .arg("-pkg")
                .arg(local)
                .args(["-target", target])
        }
    };
    spec.capture()
}

fn verify_digest(url: &str, path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ProvisionError::Download {
            url: url.to_string(),
            message: format!("SHA-256 mismatch: expected {}, got {}", expected.trim(), actual),
        });
    }
    Ok(())
}

/// Removes the downloaded package when dropped.
struct ScratchFile(PathBuf);

impl ScratchFile {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = fs::remove_file(&self.0) {
                tracing::debug!("Could not remove {}: {}", self.0.display(), e);
            }
        }
    }
}
