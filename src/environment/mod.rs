//! The isolated dependency environment.
//!
//! The environment is disposable: every provisioning run deletes whatever
//! is at its root and builds it again from the resolved runtime.

pub mod manager;

pub use manager::{EnvironmentManager, IsolatedEnvironment};
