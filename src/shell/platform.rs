//! Host platform facts used by preflight checks.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{ProvisionError, Result};

use super::command::{CommandSpec, ProcessRunner};

/// Operating system families the provisioner distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl OsFamily {
    /// The family this binary was compiled for.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => OsFamily::Windows,
            "macos" => OsFamily::MacOs,
            "linux" => OsFamily::Linux,
            _ => OsFamily::Other,
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            OsFamily::Windows => "Windows",
            OsFamily::MacOs => "macOS",
            OsFamily::Linux => "Linux",
            OsFamily::Other => std::env::consts::OS,
        }
    }

    /// Oldest supported `(major, minor)` release, if the family has one.
    pub fn minimum_version(&self) -> Option<(u32, u32)> {
        match self {
            OsFamily::Windows => Some((10, 0)),
            OsFamily::MacOs => Some((10, 9)),
            OsFamily::Linux | OsFamily::Other => None,
        }
    }

    /// Command that reports the OS release.
    fn version_query(&self) -> Option<CommandSpec> {
        let spec = match self {
            OsFamily::Windows => CommandSpec::new("cmd").args(["/C", "ver"]),
            OsFamily::MacOs => CommandSpec::new("sw_vers").arg("-productVersion"),
            OsFamily::Linux => CommandSpec::new("uname").arg("-r"),
            OsFamily::Other => return None,
        };
        Some(spec.capture().timeout(Duration::from_secs(10)))
    }
}

/// Facts about the machine being provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: OsFamily,
    /// `(major, minor)` OS release, if it could be determined.
    pub os_version: Option<(u32, u32)>,
    pub is_64bit: bool,
}

impl HostInfo {
    /// Inspect the current host.
    pub fn detect(runner: &dyn ProcessRunner) -> Self {
        Self::detect_with(OsFamily::current(), runner, |key: &str| std::env::var(key))
    }

    /// Inspect a host of family `os` with a custom env var lookup function.
    pub fn detect_with<F>(os: OsFamily, runner: &dyn ProcessRunner, env_fn: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        let os_version = os
            .version_query()
            .and_then(|spec| runner.run(&spec).ok())
            .filter(|r| r.success)
            .and_then(|r| parse_os_version(&r.stdout));

        Self {
            os,
            os_version,
            is_64bit: os_is_64bit(os, env_fn),
        }
    }

    /// Fail unless the host meets the minimum OS release and bitness.
    ///
    /// An undeterminable release is tolerated with a warning; only a known
    /// release below the minimum is fatal.
    pub fn check_supported(&self) -> Result<()> {
        if !self.is_64bit {
            return Err(ProvisionError::preflight(
                "a 64-bit operating system is required",
            ));
        }

        let Some(minimum) = self.os.minimum_version() else {
            return Ok(());
        };

        match self.os_version {
            Some(found) if found < minimum => Err(ProvisionError::preflight(format!(
                "{} {}.{} or newer is required (found {}.{})",
                self.os.name(),
                minimum.0,
                minimum.1,
                found.0,
                found.1
            ))),
            Some(_) => Ok(()),
            None => {
                tracing::warn!(
                    "Could not determine the {} release; continuing",
                    self.os.name()
                );
                Ok(())
            }
        }
    }
}

/// Whether the operating system, not this binary, is 64-bit.
///
/// A 32-bit process on 64-bit Windows sees `PROCESSOR_ARCHITECTURE=x86` and
/// the real architecture in `PROCESSOR_ARCHITEW6432`.
pub fn os_is_64bit<F>(os: OsFamily, env_fn: F) -> bool
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    if os != OsFamily::Windows {
        return cfg!(target_pointer_width = "64");
    }
    ["PROCESSOR_ARCHITEW6432", "PROCESSOR_ARCHITECTURE"]
        .into_iter()
        .find_map(|key| env_fn(key).ok().filter(|v| !v.is_empty()))
        .map_or(cfg!(target_pointer_width = "64"), |arch| arch.contains("64"))
}

/// Regex for the first `major.minor` pair in a version report.
static OS_VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)").expect("OS_VERSION_REGEX must compile"));

/// Extract the first `major.minor` pair from an OS version report.
///
/// Handles `Microsoft Windows [Version 10.0.19045.3803]`, `14.2.1`
/// and `6.5.0-14-generic`.
pub fn parse_os_version(text: &str) -> Option<(u32, u32)> {
    let caps = OS_VERSION_REGEX.captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Check if running as root/admin.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    {
        // `net session` only succeeds from an elevated token.
        std::process::Command::new("net")
            .arg("session")
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}
