//! Runtime discovery and installation.
//!
//! - [`version`]: version parsing, ordering and the provisioning target
//! - [`layout`]: per-OS executable names, install roots and packages
//! - [`probe`]: asking a candidate executable for its version
//! - [`resolver`]: choosing the best installed runtime
//! - [`installer`]: unattended vendor install

pub mod installer;
pub mod layout;
pub mod probe;
pub mod resolver;
pub mod version;

pub use installer::{InstallOptions, RuntimeInstaller};
pub use layout::{HostLayout, InstallerKind, InstallerPackage, DEFAULT_DISTRIBUTION_URL};
pub use probe::{probe, RuntimeCandidate};
pub use resolver::{select_best, VersionResolver};
pub use version::{Architecture, InstallScope, RuntimeVersion, TargetSpec};
