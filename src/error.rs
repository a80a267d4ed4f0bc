//! Error types for provisioning operations.
//!
//! This module defines [`ProvisionError`], the error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every provisioning state fails with a dedicated variant so the log
//!   marker names the failing concern (see [`ProvisionError::kind`])
//! - Use `anyhow::Error` (via `ProvisionError::Other`) for unexpected errors
//! - Messages should point the user at something actionable

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Host or inputs do not meet the preconditions of a run.
    #[error("Preflight check failed: {message}")]
    Preflight { message: String },

    /// The vendor distribution source could not be reached.
    #[error("Cannot reach {url}: {message}")]
    Connectivity { url: String, message: String },

    /// A manifest line carries no exact-version or content pin.
    #[error("Unpinned requirement in {path} line {line_number}: {line}")]
    UnpinnedRequirement {
        path: PathBuf,
        line_number: usize,
        line: String,
    },

    /// An all-users install was requested without elevated privileges.
    #[error("Insufficient privileges: {message}")]
    Privilege { message: String },

    /// The runtime installer exited unsuccessfully.
    #[error("Runtime installer {installer} failed with exit code {code:?}")]
    InstallerExecution {
        installer: PathBuf,
        code: Option<i32>,
    },

    /// No adequate runtime could be located after installing it.
    #[error("Runtime {version} not found after installation")]
    RuntimeNotFound { version: String },

    /// The isolated environment could not be built or verified.
    #[error("Failed to create environment at {path}: {message}")]
    EnvironmentCreation { path: PathBuf, message: String },

    /// Tooling upgrade or manifest install failed.
    #[error("Dependency step '{step}' failed with exit code {code:?}")]
    DependencyInstall { step: String, code: Option<i32> },

    /// A post-install hook exited unsuccessfully.
    #[error("Post-install hook '{hook}' failed with exit code {code:?}")]
    PostInstallHook { hook: String, code: Option<i32> },

    /// The external health check reported failure.
    #[error("Health check failed: {message}")]
    HealthCheck { message: String },

    /// The installer download failed or did not match its digest.
    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// Configuration file not found at an explicitly requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A subprocess specification was rejected before spawning.
    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },

    /// A subprocess could not be started.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProvisionError {
    /// Stable label used in the log file's error marker.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Preflight { .. } => "PreflightError",
            Self::Connectivity { .. } => "ConnectivityError",
            Self::UnpinnedRequirement { .. } => "UnpinnedRequirementError",
            Self::Privilege { .. } => "PrivilegeError",
            Self::InstallerExecution { .. } => "InstallerExecutionError",
            Self::RuntimeNotFound { .. } => "RuntimeNotFoundError",
            Self::EnvironmentCreation { .. } => "EnvironmentCreationError",
            Self::DependencyInstall { .. } => "DependencyInstallError",
            Self::PostInstallHook { .. } => "PostInstallHookError",
            Self::HealthCheck { .. } => "HealthCheckError",
            Self::Download { .. } => "DownloadError",
            Self::ConfigNotFound { .. } => "ConfigNotFoundError",
            Self::ConfigParse { .. } => "ConfigParseError",
            Self::InvalidCommand { .. } => "InvalidCommandError",
            Self::CommandFailed { .. } => "CommandError",
            Self::Io(_) => "IoError",
            Self::Other(_) => "Error",
        }
    }

    /// Shorthand for a preflight failure.
    pub fn preflight(message: impl Into<String>) -> Self {
        Self::Preflight {
            message: message.into(),
        }
    }

    /// Shorthand for an environment creation failure.
    pub fn environment(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::EnvironmentCreation {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;
