//! Command implementations.

pub mod check;
pub mod completions;
pub mod dispatcher;
pub mod launch;
pub mod provision;
pub mod status;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
