//! Explicit command search path.
//!
//! Provisioning never mutates the process-wide `PATH`. Instead a
//! [`SearchPath`] value is built once from the environment, extended with
//! the resolved runtime's directories, and handed to every subprocess.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};

/// An ordered list of directories searched for commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    /// Snapshot the current process `PATH`.
    pub fn from_env() -> Self {
        Self {
            entries: path_from_env(),
        }
    }

    /// Build a search path from explicit entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Directories in search order.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Return a new search path with `dirs` placed first, in the given order.
    ///
    /// Existing occurrences of a prepended directory are dropped so each
    /// directory appears once.
    pub fn prepend<I>(&self, dirs: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut entries: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if !entries.contains(&dir) {
                entries.push(dir);
            }
        }
        for existing in &self.entries {
            if !entries.contains(existing) {
                entries.push(existing.clone());
            }
        }
        Self { entries }
    }

    /// Render as a platform `PATH` value.
    pub fn to_os_string(&self) -> Result<OsString> {
        std::env::join_paths(&self.entries).map_err(|e| ProvisionError::InvalidCommand {
            message: format!("search path entry cannot be joined: {}", e),
        })
    }

    /// Find `tool` in the search path.
    pub fn resolve(&self, tool: &str) -> Option<PathBuf> {
        self.entries
            .iter()
            .map(|dir| dir.join(tool))
            .find(|candidate| is_executable(candidate))
    }
}

/// Whether `path` is a file this process could execute.
///
/// Unix checks the permission bits; elsewhere any regular file counts.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = path.metadata() else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

fn path_from_env() -> Vec<PathBuf> {
    match std::env::var_os("PATH") {
        Some(raw) => std::env::split_paths(&raw).collect(),
        None => Vec::new(),
    }
}
