//! Provisioning orchestration.
//!
//! - [`provisioner`]: the provisioning state machine
//! - [`launcher`]: provision-if-needed, then run the application
//! - [`outcome`]: the persisted status of the last run

pub mod launcher;
pub mod outcome;
pub mod provisioner;

pub use launcher::{check_readiness, Launcher, Readiness};
pub use outcome::RunOutcome;
pub use provisioner::{ProvisionContext, ProvisionReport, ProvisionState, Provisioner};
