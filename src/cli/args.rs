//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct. Running without a
//! subcommand behaves like `kindling launch` with defaults.

use clap::{Args, FromArgMatches, Parser, Subcommand};
use clap_complete::Shell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::SettingsOverrides;
use crate::runtime::{Architecture, RuntimeVersion};

/// Kindling - provision a pinned Python runtime and environment, then launch.
#[derive(Debug, Parser)]
#[command(name = "kindling")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides <app root>/kindling.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision the runtime, environment and dependencies
    Provision(ProvisionArgs),

    /// Provision if needed, then run the application (default)
    Launch(LaunchArgs),

    /// Validate the requirements manifest without provisioning
    Check(CheckArgs),

    /// Show the outcome of the last provisioning run
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by `provision` and `launch`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProvisionArgs {
    /// Application root (defaults to the current directory)
    #[arg(long, env = "KINDLING_APP_ROOT")]
    pub app_root: Option<PathBuf>,

    /// Isolated environment directory [default: <app root>/venv]
    #[arg(long)]
    pub venv: Option<PathBuf>,

    /// Requirements manifest [default: <app root>/requirements.txt]
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Provisioning log [default: <app root>/logger/logs/provision.log]
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Runtime version to provision [default: 3.11.9]
    #[arg(long, env = "KINDLING_PYTHON_VERSION")]
    pub python_version: Option<RuntimeVersion>,

    /// Runtime architecture
    #[arg(long, value_enum)]
    pub arch: Option<Architecture>,

    /// Install the runtime for all users (requires elevation)
    #[arg(long)]
    pub all_users: bool,

    /// Skip the external health check
    #[arg(long)]
    pub skip_health_check: bool,

    /// Tolerate manifest lines without an exact pin
    #[arg(long)]
    pub allow_unpinned: bool,
}

impl ProvisionArgs {
    /// Flag values in the shape settings resolution expects.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            venv: self.venv.clone(),
            manifest: self.manifest.clone(),
            log_file: self.log_file.clone(),
            python_version: self.python_version,
            arch: self.arch,
            all_users: self.all_users,
            skip_health_check: self.skip_health_check,
            allow_unpinned: self.allow_unpinned,
        }
    }

    /// The app root, falling back to `cwd`.
    pub fn app_root_or(&self, cwd: &Path) -> PathBuf {
        resolve_app_root(self.app_root.as_deref(), cwd)
    }
}

/// Arguments for the `launch` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub provision: ProvisionArgs,

    /// Rebuild the environment even if it looks healthy
    #[arg(long)]
    pub reprovision: bool,

    /// Arguments passed through to the application
    #[arg(last = true)]
    pub app_args: Vec<OsString>,
}

impl LaunchArgs {
    /// Defaults for a bare `kindling` invocation, with env-backed flags applied.
    pub fn from_env() -> Result<Self, clap::Error> {
        let matches =
            Self::augment_args(clap::Command::new("launch")).try_get_matches_from(["launch"])?;
        Self::from_arg_matches(&matches)
    }
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Application root (defaults to the current directory)
    #[arg(long, env = "KINDLING_APP_ROOT")]
    pub app_root: Option<PathBuf>,

    /// Requirements manifest [default: <app root>/requirements.txt]
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Tolerate manifest lines without an exact pin
    #[arg(long)]
    pub allow_unpinned: bool,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Application root (defaults to the current directory)
    #[arg(long, env = "KINDLING_APP_ROOT")]
    pub app_root: Option<PathBuf>,

    /// Print the raw status record as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// `explicit` resolved against `cwd`, or `cwd` itself.
pub fn resolve_app_root(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    match explicit {
        Some(root) => cwd.join(root),
        None => cwd.to_path_buf(),
    }
}
