//! Runtime versions and the provisioning target.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Regex for a `major.minor[.patch]` version inside arbitrary text.
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("VERSION_REGEX must compile")
});

/// A three-component runtime version.
///
/// Ordering is lexicographic over `(major, minor, patch)`. `major.minor`
/// is the compatibility key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl RuntimeVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extract a version from a self-report such as `Python 3.11.9`.
    ///
    /// A missing patch component reads as 0 and pre-release suffixes
    /// (`3.13.0rc1`) are ignored.
    pub fn parse_reported(text: &str) -> Option<Self> {
        let caps = VERSION_REGEX.captures(text)?;
        let patch = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch,
        })
    }

    /// Whether `self` can stand in for `target`: same `major.minor`, not older.
    pub fn satisfies(&self, target: &RuntimeVersion) -> bool {
        self.major == target.major && self.minor == target.minor && self >= target
    }

    /// `"3.11"`.
    pub fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// `"311"`, as used in Windows install directory names.
    pub fn compact(&self) -> String {
        format!("{}{}", self.major, self.minor)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for RuntimeVersion {
    type Err = String;

    /// Strict parse of `major.minor.patch` for user input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(format!(
                "expected a version like 3.11.9, got '{}'",
                s.trim()
            ));
        }
        let num = |p: &str| {
            p.parse::<u32>()
                .map_err(|_| format!("invalid version component '{}' in '{}'", p, s.trim()))
        };
        Ok(Self {
            major: num(parts[0])?,
            minor: num(parts[1])?,
            patch: num(parts[2])?,
        })
    }
}

impl Serialize for RuntimeVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RuntimeVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Target CPU architecture of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 64-bit x86.
    #[default]
    Amd64,
}

impl Architecture {
    /// Suffix used in vendor installer file names.
    pub fn installer_suffix(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
        }
    }
}

/// Who the runtime is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallScope {
    #[default]
    CurrentUser,
    AllUsers,
}

impl InstallScope {
    pub fn from_all_users(all_users: bool) -> Self {
        if all_users {
            InstallScope::AllUsers
        } else {
            InstallScope::CurrentUser
        }
    }
}

/// What a provisioning run must end up with. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub version: RuntimeVersion,
    pub arch: Architecture,
    pub scope: InstallScope,
}
