//! Kindling - provision a pinned Python runtime, an isolated environment
//! and the application's dependencies, then hand off to the application.
//!
//! A provisioning run is a fixed state machine (see [`runner::Provisioner`]):
//! preflight checks, runtime resolution or installation, environment
//! rebuild, pinned dependency install, optional post-install hooks and a
//! health check.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - `kindling.yml` loading and settings resolution
//! - [`environment`] - Isolated environment rebuild and path guard
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - Installer download and connectivity checks
//! - [`health`] - External health check invocation
//! - [`hooks`] - Post-install hook scripts
//! - [`logging`] - The append-only provisioning log
//! - [`requirements`] - Manifest pin validation and pip installs
//! - [`runner`] - The provisioning state machine and the launcher
//! - [`runtime`] - Runtime discovery, versions and installation
//! - [`shell`] - Subprocess specs, runners and the search path
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use kindling::requirements::{Manifest, PinPolicy};
//! use std::path::Path;
//!
//! let manifest = Manifest::parse(Path::new("requirements.txt"), "requests==2.31.0\nflask\n");
//! let err = manifest.validate(PinPolicy::Enforce).unwrap_err();
//! assert_eq!(err.kind(), "UnpinnedRequirementError");
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod health;
pub mod hooks;
pub mod logging;
pub mod requirements;
pub mod runner;
pub mod runtime;
pub mod shell;
pub mod ui;

pub use error::{ProvisionError, Result};
