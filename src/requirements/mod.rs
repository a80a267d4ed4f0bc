//! Dependency manifest validation and installation.
//!
//! # Modules
//!
//! - [`manifest`] - Line classification and pin validation
//! - [`installer`] - pip invocations against the isolated environment

pub mod installer;
pub mod manifest;

pub use installer::{DependencyInstaller, PipOptions};
pub use manifest::{Manifest, PinPolicy, RequirementKind, RequirementLine, ValidatedManifest};
