//! Platform-specific file layout of the runtime and its environments.
//!
//! Everything that differs between Windows and Unix hosts (executable
//! names, install roots, vendor installer packages, the environment's
//! scripts directory) is answered here so the resolver, installer and
//! environment manager stay platform-neutral. The layout is built from an
//! env-var lookup function, which lets tests describe any host.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shell::{CommandSpec, OsFamily};

use super::version::{InstallScope, RuntimeVersion, TargetSpec};

/// Default vendor distribution root.
pub const DEFAULT_DISTRIBUTION_URL: &str = "https://www.python.org/ftp/python";

/// Python snippet printing the interpreter's real executable path.
const PRINT_EXECUTABLE: &str = "import sys; print(sys.executable)";

/// A directory whose children are scanned for runtime installs.
#[derive(Debug, Clone)]
pub struct ScanRoot {
    /// Directory to list.
    pub dir: PathBuf,
    /// Child directory names that look like a runtime install.
    pub pattern: Regex,
    /// Executable path relative to a matching child.
    pub executable: PathBuf,
}

/// Format of a vendor installer package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerKind {
    /// Windows `.exe` bootstrapper.
    WindowsExe,
    /// macOS flat `.pkg`.
    MacPkg,
}

/// A downloadable vendor installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerPackage {
    pub url: String,
    pub file_name: String,
    pub kind: InstallerKind,
}

/// Host-specific paths and names.
#[derive(Debug, Clone)]
pub struct HostLayout {
    os: OsFamily,
    local_app_data: Option<PathBuf>,
    program_roots: Vec<PathBuf>,
    home: Option<PathBuf>,
    temp_dir: PathBuf,
}

impl HostLayout {
    /// Layout of the current host from real environment variables.
    pub fn detect() -> Self {
        Self::with_env(
            OsFamily::current(),
            |key: &str| std::env::var(key),
            dirs::home_dir(),
            std::env::temp_dir(),
        )
    }

    /// Build a layout with a custom env var lookup function.
    pub fn with_env<F>(os: OsFamily, env_fn: F, home: Option<PathBuf>, temp_dir: PathBuf) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let var = |key: &str| env_fn(key).ok().filter(|v| !v.is_empty()).map(PathBuf::from);

        let mut program_roots: Vec<PathBuf> = Vec::new();
        for key in ["ProgramFiles", "ProgramW6432", "ProgramFiles(x86)"] {
            if let Some(dir) = var(key) {
                if !program_roots.contains(&dir) {
                    program_roots.push(dir);
                }
            }
        }

        Self {
            os,
            local_app_data: var("LOCALAPPDATA"),
            program_roots,
            home,
            temp_dir,
        }
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    /// Executable names for a runtime or environment interpreter.
    pub fn interpreter_names(&self) -> &'static [&'static str] {
        match self.os {
            OsFamily::Windows => &["python.exe"],
            _ => &["python3", "python"],
        }
    }

    /// Ask a version-aware launcher for the exact `major.minor`.
    ///
    /// The command prints the real interpreter path on success.
    pub fn launcher_query(&self, version: &RuntimeVersion) -> CommandSpec {
        let spec = match self.os {
            OsFamily::Windows => CommandSpec::new("py").arg(format!("-{}", version.short())),
            _ => CommandSpec::new(format!("python{}", version.short())),
        };
        spec.args(["-c", PRINT_EXECUTABLE])
            .capture()
            .timeout(Duration::from_secs(15))
    }

    /// Well-known install roots, per-user first.
    pub fn scan_roots(&self) -> Vec<ScanRoot> {
        let mut roots = Vec::new();
        match self.os {
            OsFamily::Windows => {
                let pattern = pattern(r"(?i)^python3\d+$");
                if let Some(local) = &self.local_app_data {
                    roots.push(ScanRoot {
                        dir: local.join("Programs").join("Python"),
                        pattern: pattern.clone(),
                        executable: PathBuf::from("python.exe"),
                    });
                }
                for dir in &self.program_roots {
                    roots.push(ScanRoot {
                        dir: dir.clone(),
                        pattern: pattern.clone(),
                        executable: PathBuf::from("python.exe"),
                    });
                }
            }
            _ => {
                if let Some(home) = &self.home {
                    roots.push(ScanRoot {
                        dir: home.join(".pyenv").join("versions"),
                        pattern: pattern(r"^3\.\d+\.\d+$"),
                        executable: PathBuf::from("bin/python3"),
                    });
                }
                if self.os == OsFamily::MacOs {
                    roots.push(ScanRoot {
                        dir: PathBuf::from("/Library/Frameworks/Python.framework/Versions"),
                        pattern: pattern(r"^3\.\d+$"),
                        executable: PathBuf::from("bin/python3"),
                    });
                }
                roots.push(ScanRoot {
                    dir: PathBuf::from("/opt"),
                    pattern: pattern(r"^python3(\.\d+)*$"),
                    executable: PathBuf::from("bin/python3"),
                });
            }
        }
        roots
    }

    /// Directory holding the runtime executable after a vendor install.
    pub fn expected_install_dir(&self, target: &TargetSpec) -> Option<PathBuf> {
        let version = &target.version;
        match self.os {
            OsFamily::Windows => {
                let dir_name = format!("Python{}", version.compact());
                match target.scope {
                    InstallScope::CurrentUser => self
                        .local_app_data
                        .as_ref()
                        .map(|d| d.join("Programs").join("Python").join(dir_name)),
                    InstallScope::AllUsers => {
                        self.program_roots.first().map(|d| d.join(dir_name))
                    }
                }
            }
            OsFamily::MacOs => Some(
                PathBuf::from("/Library/Frameworks/Python.framework/Versions")
                    .join(version.short())
                    .join("bin"),
            ),
            OsFamily::Linux | OsFamily::Other => None,
        }
    }

    /// The runtime's companion scripts directory.
    pub fn runtime_scripts_dir(&self, executable: &Path) -> PathBuf {
        let dir = executable.parent().unwrap_or(Path::new("")).to_path_buf();
        match self.os {
            OsFamily::Windows => dir.join("Scripts"),
            _ => dir,
        }
    }

    /// Scripts/bin directory inside an isolated environment.
    pub fn env_scripts_dir(&self, root: &Path) -> PathBuf {
        match self.os {
            OsFamily::Windows => root.join("Scripts"),
            _ => root.join("bin"),
        }
    }

    /// Interpreter inside an isolated environment.
    pub fn env_interpreter(&self, root: &Path) -> PathBuf {
        match self.os {
            OsFamily::Windows => self.env_scripts_dir(root).join("python.exe"),
            _ => self.env_scripts_dir(root).join("python"),
        }
    }

    /// Vendor installer for `target`, if the vendor ships one for this OS.
    pub fn installer_package(&self, target: &TargetSpec, base_url: &str) -> Option<InstallerPackage> {
        let version = target.version;
        let (file_name, kind) = match self.os {
            OsFamily::Windows => (
                format!("python-{}-{}.exe", version, target.arch.installer_suffix()),
                InstallerKind::WindowsExe,
            ),
            OsFamily::MacOs => (
                format!("python-{}-macos11.pkg", version),
                InstallerKind::MacPkg,
            ),
            OsFamily::Linux | OsFamily::Other => return None,
        };
        Some(InstallerPackage {
            url: format!("{}/{}/{}", base_url.trim_end_matches('/'), version, file_name),
            file_name,
            kind,
        })
    }

    /// Scratch directory for downloads.
    pub fn scratch_dir(&self) -> PathBuf {
        self.temp_dir.join("kindling")
    }
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("scan root pattern must compile")
}
