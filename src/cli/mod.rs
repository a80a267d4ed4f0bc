//! Command-line interface for kindling.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    CheckArgs, Cli, Commands, CompletionsArgs, LaunchArgs, ProvisionArgs, StatusArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult};
